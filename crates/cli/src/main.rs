mod auth;
mod bulk;
mod config;
mod context;
mod equipment;
mod output;
mod session_file;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dcinv_api::SearchField;
use dcinv_api_client::ClientError;
use dcinv_inventory::InventoryError;
use std::path::PathBuf;

use crate::bulk::ExportFormat;
use crate::config::ConfigUpdate;
use crate::equipment::DraftArgs;

#[derive(Parser)]
#[command(name = "dcinv", about = "Datacenter equipment inventory client")]
struct Cli {
    /// Log gateway decisions (refreshes, retries) to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session tokens
    Login {
        #[arg(long)]
        username: Option<String>,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Invalidate the session on the server and forget it locally
    Logout,

    /// List datacenters
    Datacenters,

    /// List a datacenter's equipment, optionally filtered on one field
    Show {
        datacenter: i64,
        /// service_tag, license_type or equipment_type
        #[arg(long)]
        field: Option<SearchField>,
        #[arg(long)]
        value: Option<String>,
    },

    /// Suggest known values of a field that contain TEXT
    Suggest {
        datacenter: i64,
        #[arg(long, default_value = "service_tag")]
        field: SearchField,
        text: String,
    },

    /// List common equipment types
    EquipmentTypes {
        filter: Option<String>,
    },

    /// Add an equipment record
    Add {
        datacenter: i64,
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Change fields of an equipment record
    Modify {
        datacenter: i64,
        equipment: i64,
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Delete an equipment record
    Delete {
        datacenter: i64,
        equipment: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Import equipment from an Excel file (.xlsx or .xls)
    Import { datacenter: i64, file: PathBuf },

    /// Download the equipment list as Excel or PDF
    Export {
        datacenter: i64,
        #[arg(value_enum)]
        format: ExportFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        field: Option<SearchField>,
        #[arg(long)]
        value: Option<String>,
    },

    /// Email the PDF report
    SendReport { datacenter: i64, email: String },

    /// List equipment whose license expires soon
    Expiring { datacenter: i64 },

    /// Show or set configuration
    Config {
        /// Set the server URL (including the /api prefix)
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        request_timeout: Option<u64>,
        #[arg(long)]
        import_timeout: Option<u64>,
        /// Total attempts for a call that keeps timing out
        #[arg(long)]
        max_attempts: Option<u32>,
        #[arg(long)]
        retry_delay_ms: Option<u64>,
        #[arg(long)]
        notice_secs: Option<u64>,
    },
}

#[derive(clap::Args)]
struct FieldArgs {
    #[arg(long = "type")]
    equipment_type: Option<String>,
    #[arg(long = "tag")]
    service_tag: Option<String>,
    #[arg(long = "license")]
    license_type: Option<String>,
    #[arg(long = "serial")]
    serial_number: Option<String>,
    /// License expiry date (YYYY-MM-DD)
    #[arg(long)]
    expires: Option<NaiveDate>,
}

impl From<FieldArgs> for DraftArgs {
    fn from(args: FieldArgs) -> Self {
        Self {
            equipment_type: args.equipment_type,
            service_tag: args.service_tag,
            license_type: args.license_type,
            serial_number: args.serial_number,
            expires: args.expires,
        }
    }
}

/// Text for errors the user can act on, and whether a new login is needed.
fn client_failure(err: &anyhow::Error) -> Option<(String, bool)> {
    err.chain().find_map(|cause| {
        let client = cause.downcast_ref::<ClientError>().or_else(|| {
            match cause.downcast_ref::<InventoryError>() {
                Some(InventoryError::Client(e)) => Some(e),
                _ => None,
            }
        })?;
        Some((client.user_message(), client.is_session_fatal()))
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    if cli.verbose {
        for target in ["dcinv", "dcinv_api_client", "dcinv_inventory"] {
            if let Ok(directive) = format!("{target}=debug").parse() {
                filter = filter.add_directive(directive);
            }
        }
    }
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let result = match cli.command {
        Commands::Login { username, password } => auth::run_login(username, password).await,
        Commands::Logout => auth::run_logout().await,
        Commands::Datacenters => equipment::run_datacenters().await,
        Commands::Show {
            datacenter,
            field,
            value,
        } => equipment::run_show(datacenter, field, value).await,
        Commands::Suggest {
            datacenter,
            field,
            text,
        } => equipment::run_suggest(datacenter, field, &text).await,
        Commands::EquipmentTypes { filter } => {
            equipment::run_equipment_types(filter.as_deref());
            Ok(())
        }
        Commands::Add { datacenter, fields } => equipment::run_add(datacenter, fields.into()).await,
        Commands::Modify {
            datacenter,
            equipment,
            fields,
        } => equipment::run_modify(datacenter, equipment, fields.into()).await,
        Commands::Delete {
            datacenter,
            equipment,
            yes,
        } => equipment::run_delete(datacenter, equipment, yes).await,
        Commands::Import { datacenter, file } => bulk::run_import(datacenter, &file).await,
        Commands::Export {
            datacenter,
            format,
            output,
            field,
            value,
        } => bulk::run_export(datacenter, format, output, field, value).await,
        Commands::SendReport { datacenter, email } => {
            bulk::run_send_report(datacenter, &email).await
        }
        Commands::Expiring { datacenter } => equipment::run_expiring(datacenter).await,
        Commands::Config {
            server,
            request_timeout,
            import_timeout,
            max_attempts,
            retry_delay_ms,
            notice_secs,
        } => {
            let update = ConfigUpdate {
                server,
                request_secs: request_timeout,
                import_secs: import_timeout,
                max_attempts,
                retry_delay_ms,
                notice_secs,
            };
            if update.is_empty() {
                config::show_config()
            } else {
                config::set_config(update)
            }
        }
    };

    if let Err(e) = result {
        match client_failure(&e) {
            Some((message, true)) => {
                eprintln!("{message} Run `dcinv login`.");
            }
            Some((message, false)) => eprintln!("Error: {message}"),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}
