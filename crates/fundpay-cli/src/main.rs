mod args;
mod render;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use futures_util::future::join_all;
use tracing::info;

use fundpay_client::form::{AddCampaign, Contact, FormController, FormKind, SignUp, SubmitOutcome};
use fundpay_client::list::{AdminDashboard, Dashboard, ListController, ListView, PaymentReceipts};
use fundpay_client::search::{Document, SearchController};
use fundpay_client::verify::{ActionOutcome, VerifyPaymentsController};
use fundpay_client::{Attachment, ClientConfig, HttpClient, MemorySession, Notifications};
use fundpay_types::models::{PaymentId, Role, User};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fundpay=info,fundpay_client=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    info!(api = %config.api_url, "FundPay client starting");

    let api = Arc::new(HttpClient::new(&config)?);
    let notifications = Arc::new(Notifications::new(config.notify_ttl));
    let session = session_from_env();

    render::header(&session);
    let result = run(cli.command, api, notifications.clone(), &session).await;
    render::notifications(&notifications);
    render::footer();
    result
}

async fn run(
    command: Commands,
    api: Arc<HttpClient>,
    notifications: Arc<Notifications>,
    session: &MemorySession,
) -> anyhow::Result<()> {
    match command {
        Commands::Campaigns => {
            let screen = ListController::<_, Dashboard>::new(api, notifications);
            screen.mount().await;
            render::list(screen.view(), render::campaign_row);
        }
        Commands::Admin => {
            let screen = ListController::<_, AdminDashboard>::new(api, notifications);
            if let Some(redirect) = screen.mount_for_admin(session).await {
                println!("Admins only. Redirecting to {}.", redirect.0);
                return Ok(());
            }
            render::list(screen.view(), render::campaign_row);
        }
        Commands::Receipts => {
            let screen = ListController::<_, PaymentReceipts>::new(api, notifications);
            screen.mount().await;
            match screen.view() {
                ListView::Items(_) => render::receipts(&screen.receipt_cards()),
                view => render::list(view, |_| String::new()),
            }
        }
        Commands::Pending => {
            let screen = VerifyPaymentsController::new(api, notifications);
            screen.mount().await;
            render_pending(&screen);
        }
        Commands::Verify { ids } => act(api, notifications, ids, true).await,
        Commands::Reject { ids } => act(api, notifications, ids, false).await,
        Commands::Search { query } => {
            let search = SearchController::new(api, notifications, Document::new());
            search.mount().await;
            search.set_query(query);
            render::suggestions(&search);
        }
        Commands::AddCampaign {
            title,
            description,
            target_amount,
            upi,
            bank,
            thumbnail,
            qr_code,
        } => {
            let form = FormController::<_, AddCampaign>::new(api, notifications);
            form.set_field("title", title);
            form.set_field("description", description);
            form.set_field("targetAmount", target_amount);
            form.set_field("upi", upi);
            form.set_field("bank", bank);
            if let Some(path) = thumbnail {
                form.attach("thumbnail", read_attachment(&path).await?);
            }
            if let Some(path) = qr_code {
                form.attach("qrCode", read_attachment(&path).await?);
            }
            submit(&form).await?;
        }
        Commands::Contact {
            issue,
            description,
            screenshot,
        } => {
            let form = FormController::<_, Contact>::new(api, notifications);
            form.set_field("issue", issue);
            form.set_field("description", description);
            if let Some(path) = screenshot {
                form.attach("screenshot", read_attachment(&path).await?);
            }
            submit(&form).await?;
        }
        Commands::Signup {
            name,
            email,
            password,
            role,
        } => {
            let form = FormController::<_, SignUp>::new(api, notifications);
            form.set_field("name", name);
            form.set_field("email", email);
            form.set_field("password", password);
            form.set_field("role", role);
            submit(&form).await?;
        }
    }
    Ok(())
}

async fn act(api: Arc<HttpClient>, notifications: Arc<Notifications>, ids: Vec<String>, verify: bool) {
    let screen = VerifyPaymentsController::new(api, notifications);
    screen.mount().await;

    let ids: Vec<PaymentId> = ids.into_iter().map(PaymentId).collect();
    let screen = &screen;
    let outcomes = join_all(ids.iter().map(|id| async move {
        let outcome = if verify {
            screen.verify(id).await
        } else {
            screen.reject(id).await
        };
        (id, outcome)
    }))
    .await;

    for (id, outcome) in outcomes {
        match outcome {
            ActionOutcome::Removed => println!("{id}: done"),
            ActionOutcome::Failed(message) => println!("{id}: {message}"),
            ActionOutcome::Busy => println!("{id}: already in progress"),
            ActionOutcome::Missing => println!("{id}: not in the pending list"),
            ActionOutcome::Cancelled => println!("{id}: cancelled"),
        }
    }
    println!();
    render_pending(screen);
}

fn render_pending(screen: &VerifyPaymentsController<HttpClient>) {
    match screen.view() {
        ListView::Items(_) => render::cards(&screen.cards()),
        view => render::list(view, |_| String::new()),
    }
}

async fn submit<F: FormKind>(form: &FormController<HttpClient, F>) -> anyhow::Result<()> {
    match form.submit().await {
        SubmitOutcome::Succeeded(redirect) => {
            if let Some(redirect) = redirect {
                println!("Continue at {}", redirect.0);
            }
            Ok(())
        }
        SubmitOutcome::Rejected(message) | SubmitOutcome::Failed(message) => bail!(message),
        SubmitOutcome::Busy | SubmitOutcome::Cancelled => Ok(()),
    }
}

async fn read_attachment(path: &Path) -> anyhow::Result<Attachment> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".into());
    Ok(Attachment::new(file_name, guess_mime(path), data))
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

fn session_from_env() -> MemorySession {
    let name = std::env::var("FUNDPAY_USER_NAME").unwrap_or_default();
    let email = std::env::var("FUNDPAY_USER_EMAIL").unwrap_or_default();
    if name.is_empty() && email.is_empty() {
        return MemorySession::default();
    }
    let role = std::env::var("FUNDPAY_USER_ROLE")
        .ok()
        .and_then(|r| Role::parse(&r))
        .unwrap_or_default();
    MemorySession::signed_in(User {
        name,
        email,
        role,
        image_url: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_follows_extension() {
        assert_eq!(guess_mime(Path::new("qr.PNG")), "image/png");
        assert_eq!(guess_mime(Path::new("a/b/photo.jpeg")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn cli_parses_repeated_ids() {
        let cli = Cli::parse_from(["fundpay", "verify", "p1", "p2"]);
        match cli.command {
            Commands::Verify { ids } => assert_eq!(ids, ["p1", "p2"]),
            _ => panic!("expected verify"),
        }
    }
}
