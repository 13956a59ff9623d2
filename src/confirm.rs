use async_trait::async_trait;

/// Asks the operator before anything destructive is sent.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt the same way (`--yes`, scripted runs).
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!("auto-answering {:?} with {}", prompt, self.0);
        self.0
    }
}
