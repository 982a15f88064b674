use async_trait::async_trait;

#[async_trait]
pub trait Interface: Send + Sync {
    /// Next line typed by the user, `None` at end of input.
    async fn receive_input(&self) -> Option<String>;
    async fn send_output(&self, message: &str);
    async fn show_status(&self, status: &str);
    async fn show_warning(&self, warning: &str);
    /// Set or clear the persistent "disconnected" indicator.
    async fn set_banner(&self, banner: Option<&str>);
}
