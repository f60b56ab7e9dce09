//! Solicitation (purchase request) CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::list::{self, truncate, Session};
use super::output::Output;
use crate::domain::{EntityId, EntityKind, Solicitation, SolicitationStatus};
use crate::fetch::lists;
use crate::storage::Records;

#[derive(Subcommand)]
pub enum RequestCommands {
    /// File a purchase request
    ///
    /// Example:
    ///   desk request add maria "Printer toner" --contract c-1234567
    Add {
        /// Who is asking
        requester: String,

        /// What is needed
        description: String,

        /// Contract the request falls under
        #[arg(long)]
        contract: Option<String>,
    },

    /// List requests, newest first
    List {
        /// Only requests with this status (pendente, aprovada, rejeitada)
        #[arg(long)]
        status: Option<SolicitationStatus>,
    },

    /// Approve a pending request
    Approve {
        /// Request ID
        id: String,
    },

    /// Reject a pending request
    Reject {
        /// Request ID
        id: String,
    },
}

pub fn run(cmd: RequestCommands, output: &Output) -> Result<()> {
    match cmd {
        RequestCommands::Add {
            requester,
            description,
            contract,
        } => add_request(output, &requester, &description, contract.as_deref()),
        RequestCommands::List { status } => list_requests(output, status),
        RequestCommands::Approve { id } => review(output, &id, SolicitationStatus::Approved),
        RequestCommands::Reject { id } => review(output, &id, SolicitationStatus::Rejected),
    }
}

fn add_request(
    output: &Output,
    requester: &str,
    description: &str,
    contract: Option<&str>,
) -> Result<()> {
    let contract_id = contract
        .map(|c| EntityId::parse_as(c, EntityKind::Contract))
        .transpose()?;

    let session = Session::open()?;
    let records = Records::new(session.client);

    let mut request = Solicitation::new(requester, description);
    request.contract_id = contract_id;
    records.add_solicitation(&request)?;

    if output.is_json() {
        output.data(&request);
    } else {
        output.success(&format!(
            "Created request: {} - {} ({})",
            request.id, request.description, request.status
        ));
    }

    Ok(())
}

fn list_requests(output: &Output, status: Option<SolicitationStatus>) -> Result<()> {
    let session = Session::open()?;
    let settings = session.settings();
    let timeout = settings.fetch_timeout();

    let fetcher = lists::solicitations(session.client.clone()).with_limit(settings.row_limit());
    let state = list::fetch(&fetcher, status, timeout);

    list::render(output, "solicitations", state, timeout, |requests| {
        if requests.is_empty() {
            match status {
                Some(status) => println!("No {} requests", status),
                None => println!("No requests"),
            }
            return;
        }

        println!(
            "{:<12} {:<10} {:<16} {:<12} DESCRIPTION",
            "ID", "STATUS", "REQUESTER", "CONTRACT"
        );
        println!("{}", "-".repeat(80));
        for request in requests {
            let contract = request
                .contract_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<12} {:<10} {:<16} {:<12} {}",
                request.id,
                request.status,
                truncate(&request.requester, 16),
                contract,
                truncate(&request.description, 30)
            );
        }
    })
}

fn review(output: &Output, id: &str, decision: SolicitationStatus) -> Result<()> {
    let id = EntityId::parse_as(id, EntityKind::Solicitation)?;
    let session = Session::open()?;
    let records = Records::new(session.client);

    let request = records.review_solicitation(&id, decision)?;

    if output.is_json() {
        output.data(&request);
    } else {
        output.success(&format!("Request {} is now {}", request.id, request.status));
    }

    Ok(())
}
