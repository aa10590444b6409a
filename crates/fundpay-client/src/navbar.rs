use fundpay_types::models::User;

use crate::Redirect;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

/// Avatar fallback: first letters of the first two name words, else the
/// first letter of the email, else `?`.
pub fn initials(user: Option<&User>) -> String {
    let Some(user) = user else {
        return "?".into();
    };
    let from_name: String = user
        .name
        .split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect();
    if !from_name.is_empty() {
        return from_name;
    }
    user.email
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".into())
}

pub fn nav_links(session: &dyn Session) -> Vec<NavLink> {
    let mut links = Vec::with_capacity(3);
    if session.is_admin() {
        links.push(NavLink {
            label: "Add Campaign",
            href: "/add-campaign",
        });
    }
    links.push(NavLink {
        label: "Contact",
        href: "/contact",
    });
    links.push(NavLink {
        label: "Payment Receipts",
        href: "/receipts",
    });
    links
}

pub fn logout(session: &dyn Session) -> Redirect {
    session.logout();
    Redirect("/login".into())
}
