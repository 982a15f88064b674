use crate::traits::Interface;
use async_trait::async_trait;
use std::io::BufRead;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};

/// Line-oriented console front end.
///
/// Stdin is read on a detached OS thread, so a read that never completes
/// cannot hold up runtime shutdown.
pub struct TerminalInterface {
    lines: Mutex<mpsc::Receiver<String>>,
    banner: Mutex<Option<String>>,
}

impl TerminalInterface {
    pub fn new() -> Self {
        Self::with_reader(std::io::BufReader::new(std::io::stdin()))
    }

    pub fn with_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::channel(32);
        // A failed spawn drops `tx`, which reads as end of input.
        let _ = std::thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || forward_lines(reader, tx));

        Self {
            lines: Mutex::new(rx),
            banner: Mutex::new(None),
        }
    }
}

impl Default for TerminalInterface {
    fn default() -> Self {
        Self::new()
    }
}

fn forward_lines<R: BufRead>(reader: R, tx: mpsc::Sender<String>) {
    for line in reader.lines() {
        let Ok(line) = line else { break };
        if tx.blocking_send(line.trim().to_string()).is_err() {
            break;
        }
    }
}

#[async_trait]
impl Interface for TerminalInterface {
    async fn receive_input(&self) -> Option<String> {
        self.lines.lock().await.recv().await
    }

    async fn send_output(&self, message: &str) {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(message.as_bytes()).await;
        let _ = stdout.write_all(b"\n").await;
        let _ = stdout.flush().await;
    }

    async fn show_status(&self, status: &str) {
        self.send_output(&format!("ℹ️  {}", status)).await;
    }

    async fn show_warning(&self, warning: &str) {
        self.send_output(&format!("⚠️  {}", warning)).await;
    }

    async fn set_banner(&self, banner: Option<&str>) {
        let mut current = self.banner.lock().await;
        if current.as_deref() == banner {
            return;
        }
        *current = banner.map(str::to_string);
        drop(current);

        if let Some(text) = banner {
            self.send_output(&format!("🔌 {}", text)).await;
        }
    }
}
