pub mod terminal;
pub mod traits;

pub use terminal::TerminalInterface;
pub use traits::Interface;
