use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fundpay")]
#[command(about = "Terminal front-end for the FundPay crowdfunding backend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Backend origin; overrides FUNDPAY_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Public campaign list
    Campaigns,

    /// Campaign list for administrators
    Admin,

    /// Your payment receipts
    Receipts,

    /// Payments awaiting verification
    Pending,

    /// Verify one or more pending payments
    Verify {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Reject one or more pending payments
    Reject {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Search campaigns by title
    Search { query: String },

    /// Create a campaign
    AddCampaign {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long)]
        target_amount: String,

        #[arg(long, default_value = "")]
        upi: String,

        #[arg(long, default_value = "")]
        bank: String,

        #[arg(long)]
        thumbnail: Option<PathBuf>,

        #[arg(long)]
        qr_code: Option<PathBuf>,
    },

    /// Send a message to support
    Contact {
        #[arg(long)]
        issue: String,

        #[arg(long)]
        description: String,

        #[arg(long)]
        screenshot: Option<PathBuf>,
    },

    /// Create an account
    Signup {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long, default_value = "user")]
        role: String,
    },
}
