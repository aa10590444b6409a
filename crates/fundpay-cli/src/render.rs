use chrono::{Datelike, Local};
use fundpay_client::format::format_currency;
use fundpay_client::list::{ListView, ReceiptCard};
use fundpay_client::navbar::{initials, nav_links};
use fundpay_client::search::SearchController;
use fundpay_client::verify::PaymentCard;
use fundpay_client::{FundpayApi, Notifications, Session, Severity};
use fundpay_types::models::Campaign;

pub fn header(session: &dyn Session) {
    let user = session.current_user();
    let links: Vec<_> = nav_links(session).iter().map(|l| l.label).collect();
    println!("FundPay [{}]  {}", initials(user.as_ref()), links.join(" | "));
    println!();
}

pub fn footer() {
    println!();
    println!("\u{a9} {} FundPay. All rights reserved.", Local::now().year());
}

pub fn list<T>(view: ListView<T>, row: impl Fn(&T) -> String) {
    match view {
        ListView::Loader => println!("Loading..."),
        ListView::Error { message } => println!("{message}"),
        ListView::Empty { message } => println!("{message}"),
        ListView::Items(items) => {
            for item in &items {
                println!("{}", row(item));
            }
        }
    }
}

pub fn campaign_row(campaign: &Campaign) -> String {
    format!(
        "{:<24} {:>14}  {}",
        campaign.id,
        format_currency(campaign.target_amount),
        campaign.title
    )
}

pub fn receipts(cards: &[ReceiptCard]) {
    for card in cards {
        println!(
            "{:<24} {:>12}  {:<9} {}  {}",
            card.id,
            card.amount,
            card.status,
            card.date.as_deref().unwrap_or("-"),
            card.campaign
        );
        match &card.receipt_url {
            Some(url) => println!("{:<24} {}: {url}", "", card.receipt_label),
            None => println!("{:<24} {}", "", card.receipt_label),
        }
    }
}

pub fn cards(cards: &[PaymentCard]) {
    for card in cards {
        let state = if card.actions_disabled { " (busy)" } else { "" };
        println!(
            "{:<24} {:>12}  {:<20} [{}] [{}]{state}",
            card.id, card.amount, card.payer, card.verify_label, card.reject_label
        );
        if let Some(url) = &card.screenshot_url {
            println!("{:<24} screenshot: {url}", "");
        }
    }
}

pub fn suggestions<A: FundpayApi>(search: &SearchController<A>) {
    if !search.panel_visible() {
        println!("No campaigns match \"{}\".", search.query());
        return;
    }
    for campaign in search.suggestions() {
        println!("{:<24} {}", campaign.id, campaign.title);
    }
}

/// Prints and clears whatever the screen queued for the user.
pub fn notifications(queue: &Notifications) {
    for note in queue.drain() {
        let tag = match note.severity {
            Severity::Success => "ok",
            Severity::Info => "info",
            Severity::Error => "error",
        };
        eprintln!("[{tag}] {}", note.message);
    }
}
