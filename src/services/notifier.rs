// src/services/notifier.rs
//
// Seam de notificações: melhor esforço, nunca no caminho da resposta.

use std::sync::Arc;

use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

// Implementação padrão: registra a entrega no log. A troca por um
// provedor real de e-mail é só outra impl deste trait.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> anyhow::Result<()> {
        tracing::info!("📧 Notificação para {}: {}", to, subject);
        Ok(())
    }
}

/// Dispara em background. Falha de entrega é logada e engolida aqui;
/// jamais converte uma mutação bem-sucedida em erro para o cliente.
pub fn dispatch(notifier: Arc<dyn Notifier>, to: String, subject: String, body: String) {
    tokio::spawn(async move {
        if let Err(e) = notifier.send(&to, &subject, &body).await {
            tracing::warn!("Falha ao enviar notificação para {}: {}", to, e);
        }
    });
}
