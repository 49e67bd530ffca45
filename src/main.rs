mod proxy_table;

use std::fs;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use proxydeck_core::client::{HttpStore, ProxyStore};
use proxydeck_core::export::render_txt;
use proxydeck_core::import::ImportOrchestrator;
use proxydeck_core::models::proxies::{
    ExportFormat, ImportStatus, Protocol, ProxyPatch, ProxySpec, ProxyStatus,
};
use proxydeck_core::parse::parse_batch;
use proxydeck_core::query::{QuerySync, SortDirection, SEARCH_DEBOUNCE};
use tracing::warn;

use crate::proxy_table::ProxyTable;

const EXPORT_PAGE_LIMIT: u32 = 10000;

#[derive(Debug, Parser)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// A subcommand for listing proxies in the pool
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        #[arg(short, long, default_value_t = 10)]
        limit: u32,

        /// Free-text address search
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        status: Option<StatusArg>,

        #[arg(long)]
        protocol: Option<ProtocolArg>,

        /// Field to sort by (e.g. address, status, requests)
        #[arg(long)]
        sort: Option<String>,

        #[arg(long, value_enum, default_value = "asc")]
        order: OrderArg,
    },
    /// A subcommand for adding a single proxy
    Add {
        /// host:port
        address: String,

        #[arg(long, value_enum, default_value = "http")]
        protocol: ProtocolArg,

        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        password: Option<String>,

        #[arg(short, long)]
        label: Option<String>,
    },
    /// A subcommand for editing fields of an existing proxy
    Edit {
        id: i64,

        #[arg(long)]
        address: Option<String>,

        #[arg(long, value_enum)]
        protocol: Option<ProtocolArg>,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        label: Option<String>,
    },
    /// A subcommand for deleting one proxy by id
    Delete { id: i64 },
    /// A subcommand for deleting selected rows of a listed page
    BulkDelete {
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        #[arg(short, long, default_value_t = 10)]
        limit: u32,

        /// Comma separated 1-based row numbers within the page
        #[arg(short, long, value_delimiter = ',')]
        rows: Vec<usize>,

        /// Select every row of the page
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// A subcommand for running a remote-side connectivity test
    Test { id: i64 },
    /// A subcommand for importing proxies from a text file
    Import {
        file: String,

        /// Parse and preview only, without submitting
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Print the outcome list as JSON when done
        #[arg(long, default_value_t = false)]
        report_json: bool,
    },
    /// A subcommand for exporting the pool
    Export {
        #[arg(short, long, value_enum, default_value = "txt")]
        format: FormatArg,

        /// File to write; stdout when omitted
        #[arg(short, long)]
        output: Option<String>,
    },
    /// A subcommand for reloading the rotation pool
    Reload,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProtocolArg {
    Http,
    Https,
    Socks4,
    Socks4a,
    Socks5,
}

impl From<ProtocolArg> for Protocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Http => Protocol::Http,
            ProtocolArg::Https => Protocol::Https,
            ProtocolArg::Socks4 => Protocol::Socks4,
            ProtocolArg::Socks4a => Protocol::Socks4a,
            ProtocolArg::Socks5 => Protocol::Socks5,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Active,
    Failed,
    Idle,
}

impl From<StatusArg> for ProxyStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Active => ProxyStatus::Active,
            StatusArg::Failed => ProxyStatus::Failed,
            StatusArg::Idle => ProxyStatus::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortDirection {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Asc => SortDirection::Asc,
            OrderArg::Desc => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Txt,
    Json,
    Csv,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let store = HttpStore::from_env().expect("error creating store client");
    match cli.command {
        Command::List {
            page,
            limit,
            search,
            status,
            protocol,
            sort,
            order,
        } => {
            let mut sync = build_sync(page, limit, search, status, protocol, sort, order);
            fetch_and_render(&store, &mut sync).await;
        }
        Command::Add {
            address,
            protocol,
            username,
            password,
            label,
        } => {
            let spec = ProxySpec {
                address,
                protocol: protocol.into(),
                username,
                password,
                label,
                raw_line: String::new(),
            };
            let record = store.create(&spec).await.expect("error adding proxy");
            println!("Added proxy {} ({})", record.address, record.id);
        }
        Command::Edit {
            id,
            address,
            protocol,
            username,
            password,
            label,
        } => {
            let patch = ProxyPatch {
                address,
                protocol: protocol.map(Into::into),
                username,
                password,
                label,
            };
            let record = store.update(id, &patch).await.expect("error updating proxy");
            println!("Updated proxy {} ({})", record.address, record.id);
        }
        Command::Delete { id } => {
            store.delete(id).await.expect("error deleting proxy");
            println!("Deleted proxy {}", id);
        }
        Command::BulkDelete {
            page,
            limit,
            rows,
            all,
        } => {
            let mut sync = build_sync(page, limit, None, None, None, None, OrderArg::Asc);
            let req = sync.refresh();
            let listing = store.list(&req.state).await.expect("error fetching proxies");
            sync.apply_success(req.seq, listing);

            if all {
                let count = sync.rows().len();
                sync.selection_mut().select_all(count);
            } else {
                for row in rows {
                    // rows are 1-based on the command line
                    if row >= 1 {
                        sync.selection_mut().select(row - 1);
                    }
                }
            }

            let ids = sync.selected_ids();
            if ids.is_empty() {
                println!("No rows selected.");
                return;
            }
            store
                .bulk_delete(&ids)
                .await
                .expect("error deleting proxies");
            sync.selection_mut().clear();
            println!("Deleted {} proxies", ids.len());
        }
        Command::Test { id } => {
            let report = store.test(id).await.expect("error testing proxy");
            match report.status {
                ProxyStatus::Active => println!(
                    "{} ok - {}ms",
                    report.address,
                    report.response_time.unwrap_or_default()
                ),
                _ => println!(
                    "{} {} - {}",
                    report.address,
                    report.status,
                    report.error.unwrap_or_else(|| "unknown error".into())
                ),
            }
        }
        Command::Import {
            file,
            dry_run,
            report_json,
        } => {
            let content = fs::read_to_string(file).expect("error reading import file");
            let specs = parse_batch(&content);
            println!(
                "{} valid proxies found ({} lines)",
                specs.len(),
                content.lines().count()
            );
            preview(&specs);
            if dry_run || specs.is_empty() {
                return;
            }

            run_import(&store, &specs, report_json).await;
        }
        Command::Export { format, output } => {
            let payload = match format {
                FormatArg::Txt => {
                    let mut sync = build_sync(
                        1,
                        EXPORT_PAGE_LIMIT,
                        None,
                        None,
                        None,
                        None,
                        OrderArg::Asc,
                    );
                    let req = sync.refresh();
                    let listing = store.list(&req.state).await.expect("error fetching proxies");
                    sync.apply_success(req.seq, listing);
                    render_txt(sync.rows()).into_bytes()
                }
                FormatArg::Json => store
                    .export(ExportFormat::Json)
                    .await
                    .expect("error exporting proxies"),
                FormatArg::Csv => store
                    .export(ExportFormat::Csv)
                    .await
                    .expect("error exporting proxies"),
            };
            match output {
                Some(path) => {
                    fs::write(&path, payload).expect("error writing export file");
                    println!("Exported to {}", path);
                }
                None => print!("{}", String::from_utf8_lossy(&payload)),
            }
        }
        Command::Reload => {
            store.reload_pool().await.expect("error reloading pool");
            println!("Proxy pool reloaded. All proxies are available for rotation.");
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_sync(
    page: u32,
    limit: u32,
    search: Option<String>,
    status: Option<StatusArg>,
    protocol: Option<ProtocolArg>,
    sort: Option<String>,
    order: OrderArg,
) -> QuerySync {
    let mut sync = QuerySync::new();
    sync.set_page_size(limit);
    if let Some(search) = search {
        // one-shot run: feed the input and let the quiet period elapse
        let now = Instant::now();
        sync.search_input(&search, now);
        sync.poll_search(now + SEARCH_DEBOUNCE);
    }
    sync.set_status_filter(status.map(Into::into));
    sync.set_protocol_filter(protocol.map(Into::into));
    sync.set_sort(sort.map(|field| (field, order.into())));
    sync.set_page(page);
    sync
}

async fn fetch_and_render(store: &HttpStore, sync: &mut QuerySync) {
    let req = sync.refresh();
    match store.list(&req.state).await {
        Ok(listing) => {
            sync.apply_success(req.seq, listing);
            let table = ProxyTable(sync.rows());
            println!("{}", table);
            let meta = sync.pagination();
            println!(
                "Page {} of {} ({} total proxies)",
                meta.page, meta.total_pages, meta.total
            );
        }
        Err(e) => {
            sync.apply_failure(req.seq, &e);
            eprintln!("Failed to fetch proxies: {}", e);
        }
    }
}

fn preview(specs: &[ProxySpec]) {
    for spec in specs.iter().take(10) {
        let extras = [
            spec.username.as_deref().map(|u| format!("user: {u}")),
            spec.label.as_deref().map(|l| format!("label: {l}")),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");
        if extras.is_empty() {
            println!("  {} {}", spec.protocol, spec.address);
        } else {
            println!("  {} {} ({})", spec.protocol, spec.address, extras);
        }
    }
    if specs.len() > 10 {
        println!("  ... and {} more", specs.len() - 10);
    }
}

async fn run_import(store: &HttpStore, specs: &[ProxySpec], report_json: bool) {
    let mut orch = ImportOrchestrator::new();
    let mut sync = QuerySync::new();

    let refresh = Box::pin(async {
        let req = sync.refresh();
        match store.list(&req.state).await {
            Ok(listing) => {
                if sync.apply_success(req.seq, listing) {
                    println!("Pool now holds {} proxies.", sync.pagination().total);
                }
            }
            Err(e) => warn!("post-import refresh failed: {e}"),
        }
    });

    orch.run_then_refresh(
        store,
        specs,
        |progress, outcome| {
            let marker = match outcome.status {
                ImportStatus::Success => "+",
                ImportStatus::Skipped => "~",
                ImportStatus::Failed => "!",
            };
            println!(
                "[{}/{}] {} {} {}",
                progress.current,
                progress.total,
                marker,
                outcome.address,
                outcome.error.as_deref().unwrap_or_default()
            );
        },
        refresh,
    )
    .await;

    let progress = orch.progress();
    println!(
        "Import complete: {} successful, {} skipped, {} failed",
        progress.success, progress.skipped, progress.failed
    );
    if report_json {
        let report =
            serde_json::to_string_pretty(orch.outcomes()).expect("error encoding report");
        println!("{}", report);
    }
}
