use clap::{Parser, Subcommand, ValueEnum};
use folio::auth::AuthMode;
use folio::canvas::{render_block_library, render_canvas, CanvasInput};
use folio::console::{Console, Tone};
use folio::model::{NewsStatus, PageStatus};
use folio::panel::{render_panel, PanelModel};
use folio::persistence::{HttpEndpoint, LoadSource, RemoteEndpoint, TokenPrompt};
use folio::picker::{attach_to_selected, candidates, PickerKind};
use folio::storage::{LocalStorage, STORAGE_FILE};
use folio::store::NewsPatch;
use folio::validation::validate_site;
use folio::BlockRegistry;
use std::io::{BufRead, Write};
use std::path::Path;
use std::process;

/// Folio console: edit pages block by block and publish them
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Path to the data directory (default: current directory)
    #[arg(long, default_value = ".")]
    data_dir: String,

    /// Base URL of the proxy functions
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    endpoint: String,

    /// Output format
    #[arg(long, default_value = "yaml")]
    format: OutputFormat,

    /// Session token to store before running the command
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum NewsState {
    Draft,
    Published,
}

impl From<NewsState> for NewsStatus {
    fn from(s: NewsState) -> Self {
        match s {
            NewsState::Draft => NewsStatus::Draft,
            NewsState::Published => NewsStatus::Published,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Unlock the console
    Login {
        user: String,
        #[arg(long)]
        password: String,
        /// Keep the password as the session token sent to the proxies
        #[arg(long)]
        token_mode: bool,
    },

    /// Lock the console and forget the session token
    Logout,

    /// List pages
    Pages,

    /// Create a page; its slug is derived from the name
    NewPage { name: String },

    /// Render a page's canvas as HTML
    Show {
        page: String,
        /// Highlight a block and render its property panel
        #[arg(long)]
        select: Option<String>,
    },

    /// List the block library
    Blocks {
        /// Render the drag-source HTML instead of structured output
        #[arg(long)]
        html: bool,
    },

    /// Append a block to a page
    Add { page: String, block_type: String },

    /// Remove a block from a page
    Remove { page: String, block: String },

    /// Reorder a page's blocks
    Move {
        page: String,
        /// Block ids in their new order
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Set a block field. Textarea fields take real line breaks.
    Set {
        page: String,
        block: String,
        key: String,
        value: String,
    },

    /// Attach a media asset to a block (lists candidates when no id is given)
    AttachMedia {
        page: String,
        block: String,
        media: Option<String>,
        #[arg(long, conflicts_with = "media")]
        clear: bool,
    },

    /// Attach a document to a block (lists candidates when no id is given)
    AttachDoc {
        page: String,
        block: String,
        doc: Option<String>,
        #[arg(long, conflicts_with = "doc")]
        clear: bool,
    },

    /// Manage the media library
    Media {
        #[command(subcommand)]
        action: MediaAction,
    },

    /// Manage documents
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Manage news items
    News {
        #[command(subcommand)]
        action: NewsAction,
    },

    /// Show or update SEO settings
    Seo {
        #[arg(long)]
        site_title: Option<String>,
        #[arg(long)]
        site_description: Option<String>,
        /// Per-page title (e.g. --page-title index="Home | Site")
        #[arg(long = "page-title", value_parser = parse_key_value)]
        page_titles: Vec<(String, String)>,
    },

    /// Save a page locally, and optionally commit the content remotely
    Save {
        page: Option<String>,
        #[arg(long)]
        remote: bool,
    },

    /// Save, commit, and trigger a deploy for a page
    Publish { page: String },

    /// Replace local state with the builder state from the repository
    PullBuilder,

    /// Commit the whole local state as builder state
    PushBuilder,

    /// Check slugs, block ownership, schemas and references
    Validate,
}

#[derive(Subcommand)]
enum MediaAction {
    List,
    Add { name: String, url: String },
    Remove { id: String },
}

#[derive(Subcommand)]
enum DocsAction {
    List,
    Add {
        title: String,
        url: String,
        #[arg(long, default_value = "General")]
        category: String,
        #[arg(long, default_value = "")]
        date: String,
    },
    Remove { id: String },
}

#[derive(Subcommand)]
enum NewsAction {
    List,
    Add {
        title: String,
        #[arg(long, default_value = "")]
        date: String,
    },
    Set {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        status: Option<NewsState>,
        #[arg(long)]
        excerpt: Option<String>,
        #[arg(long)]
        body: Option<String>,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("Invalid key=value pair: no '=' found in '{s}'"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Reads a replacement token from the terminal.
struct StdinPrompt;

impl TokenPrompt for StdinPrompt {
    fn prompt(&mut self, header: &str) -> Option<String> {
        eprint!("Token rejected. New value for {header}: ");
        std::io::stderr().flush().ok()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).ok()?;
        Some(line.trim().to_string())
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn open_console(cli: &Cli) -> CliResult<Console> {
    let dir = Path::new(&cli.data_dir);
    log::debug!("Opening data dir {} (endpoint {})", dir.display(), cli.endpoint);
    std::fs::create_dir_all(dir)?;
    let storage = LocalStorage::open(&dir.join(STORAGE_FILE))?;
    let registry = BlockRegistry::load_or_builtin(dir)?;
    let endpoint: Box<dyn RemoteEndpoint> = Box::new(HttpEndpoint::new(&cli.endpoint)?);
    Ok(Console::new(
        storage,
        registry,
        Some(endpoint),
        Box::new(StdinPrompt),
    ))
}

async fn run(cli: Cli) -> CliResult<()> {
    let mut console = open_console(&cli)?;
    if let Some(token) = &cli.token {
        console.auth().set_token(token)?;
    }

    match &cli.command {
        Command::Login {
            user,
            password,
            token_mode,
        } => {
            let mode = if *token_mode {
                AuthMode::Token
            } else {
                AuthMode::Cosmetic
            };
            console.auth().login(user, password, mode)?;
            return print_output(&serde_json::json!({ "ok": true }), &cli.format);
        }
        Command::Logout => {
            console.auth().logout()?;
            return print_output(&serde_json::json!({ "ok": true }), &cli.format);
        }
        _ => {}
    }

    if !console.auth().is_authed() {
        return Err("Console is locked; run `folio login` first".into());
    }

    match cli.command {
        Command::Login { .. } | Command::Logout => {}

        Command::Pages => {
            let pages: Vec<_> = console
                .store()
                .pages()
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "id": p.id,
                        "name": p.name,
                        "slug": p.slug,
                        "status": p.status.as_str(),
                        "updatedAt": p.updated_at,
                        "blocks": p.layout.len(),
                    })
                })
                .collect();
            print_output(&serde_json::Value::Array(pages), &cli.format)?;
        }

        Command::NewPage { name } => {
            let id = console.store_mut().create_page(&name)?;
            save_or_fail(&mut console).await?;
            print_output(&serde_json::json!({ "id": id }), &cli.format)?;
        }

        Command::Show { page, select } => {
            let store = console.store_mut();
            store.set_active_page(&page)?;
            if let Some(block) = &select {
                store.select_block(block)?;
            }
            println!("{}", render_canvas(&CanvasInput::from_store(store)));
            if select.is_some() {
                let model = PanelModel::for_block(store.registry(), store.draft());
                println!("{}", render_panel(&model));
            }
        }

        Command::Blocks { html } => {
            let registry = console.store().registry();
            if html {
                println!("{}", render_block_library(registry));
            } else {
                let blocks: Vec<_> = registry
                    .iter()
                    .map(|(name, def)| {
                        serde_json::json!({
                            "type": name,
                            "label": def.label,
                            "category": def.category.as_str(),
                            "fields": def.schema.iter().map(|f| f.key.as_str()).collect::<Vec<_>>(),
                        })
                    })
                    .collect();
                print_output(&serde_json::Value::Array(blocks), &cli.format)?;
            }
        }

        Command::Add { page, block_type } => {
            console.store_mut().set_active_page(&page)?;
            let id = console.store_mut().add_block(&block_type)?;
            save_or_fail(&mut console).await?;
            print_output(&serde_json::json!({ "id": id }), &cli.format)?;
        }

        Command::Remove { page, block } => {
            console.store_mut().set_active_page(&page)?;
            console.store_mut().remove_block(&block)?;
            save_or_fail(&mut console).await?;
            print_output(&serde_json::json!({ "ok": true, "removed": block }), &cli.format)?;
        }

        Command::Move { page, ids } => {
            console.store_mut().set_active_page(&page)?;
            console.store_mut().reorder_blocks(&ids)?;
            save_or_fail(&mut console).await?;
            print_layout(&console, &cli.format)?;
        }

        Command::Set {
            page,
            block,
            key,
            value,
        } => {
            let store = console.store_mut();
            store.set_active_page(&page)?;
            store.select_block(&block)?;
            let declared = store
                .registry()
                .get(&store.draft().map(|b| b.block_type.clone()).unwrap_or_default())
                .is_some_and(|def| def.field(&key).is_some());
            if declared {
                store.type_into_field(&key, &value)?;
            } else {
                store.update_block_prop(&key, &value)?;
            }
            save_or_fail(&mut console).await?;
            print_layout(&console, &cli.format)?;
        }

        Command::AttachMedia {
            page,
            block,
            media,
            clear,
        } => {
            attach(&mut console, &page, &block, PickerKind::Media, media, clear, &cli.format)
                .await?;
        }

        Command::AttachDoc {
            page,
            block,
            doc,
            clear,
        } => {
            attach(&mut console, &page, &block, PickerKind::Document, doc, clear, &cli.format)
                .await?;
        }

        Command::Media { action } => {
            let store = console.store_mut();
            match action {
                MediaAction::List => {}
                MediaAction::Add { name, url } => {
                    store.add_media(&name, &url);
                }
                MediaAction::Remove { id } => {
                    store.remove_media(&id)?;
                }
            }
            save_or_fail(&mut console).await?;
            print_output(&serde_json::to_value(&console.store().state().media)?, &cli.format)?;
        }

        Command::Docs { action } => {
            let store = console.store_mut();
            match action {
                DocsAction::List => {}
                DocsAction::Add {
                    title,
                    url,
                    category,
                    date,
                } => {
                    store.add_document(&title, &category, &date, &url);
                }
                DocsAction::Remove { id } => {
                    store.remove_document(&id)?;
                }
            }
            save_or_fail(&mut console).await?;
            print_output(&serde_json::to_value(&console.store().state().docs)?, &cli.format)?;
        }

        Command::News { action } => {
            let store = console.store_mut();
            match action {
                NewsAction::List => {}
                NewsAction::Add { title, date } => {
                    store.add_news(&title, &date);
                }
                NewsAction::Set {
                    id,
                    title,
                    date,
                    status,
                    excerpt,
                    body,
                } => {
                    store.update_news(
                        &id,
                        NewsPatch {
                            title,
                            date,
                            status: status.map(Into::into),
                            excerpt,
                            body,
                        },
                    )?;
                }
            }
            save_or_fail(&mut console).await?;
            print_output(&serde_json::to_value(&console.store().state().news)?, &cli.format)?;
        }

        Command::Seo {
            site_title,
            site_description,
            page_titles,
        } => {
            let store = console.store_mut();
            store.update_seo(site_title.as_deref(), site_description.as_deref());
            for (key, title) in &page_titles {
                store.set_page_seo_title(key, title);
            }
            save_or_fail(&mut console).await?;
            print_output(&serde_json::to_value(&console.store().state().seo)?, &cli.format)?;
        }

        Command::Save { page, remote } => {
            if let Some(page) = &page {
                console.store_mut().set_active_page(page)?;
            }
            let ok = console.save(remote).await;
            finish(&mut console, ok, &cli.format)?;
        }

        Command::Publish { page } => {
            console.store_mut().set_active_page(&page)?;
            let ok = console.publish().await;
            finish(&mut console, ok, &cli.format)?;
        }

        Command::PullBuilder => {
            let source = console.load_builder().await;
            let ok = source == LoadSource::Remote && console.save(false).await;
            finish(&mut console, ok, &cli.format)?;
        }

        Command::PushBuilder => {
            let ok = console.sync_builder().await;
            finish(&mut console, ok, &cli.format)?;
        }

        Command::Validate => {
            let store = console.store();
            let result = validate_site(store.registry(), store.state());
            print_output(
                &serde_json::json!({
                    "ok": result.is_ok(),
                    "errors": result.errors,
                    "warnings": result.warnings,
                }),
                &cli.format,
            )?;
            if !result.is_ok() {
                return Err(format!("{} validation error(s)", result.errors.len()).into());
            }
        }
    }

    Ok(())
}

async fn attach(
    console: &mut Console,
    page: &str,
    block: &str,
    kind: PickerKind,
    id: Option<String>,
    clear: bool,
    format: &OutputFormat,
) -> CliResult<()> {
    let store = console.store_mut();
    store.set_active_page(page)?;
    store.select_block(block)?;

    match (id, clear) {
        (_, true) => match kind {
            PickerKind::Media => store.clear_media()?,
            PickerKind::Document => store.clear_document()?,
        },
        (Some(id), false) => {
            store.open_picker(kind, attach_to_selected(kind));
            store.pick(&id)?;
        }
        (None, false) => {
            let items: Vec<_> = candidates(store.state(), kind)
                .into_iter()
                .map(|c| serde_json::json!({ "id": c.id, "label": c.label, "detail": c.detail }))
                .collect();
            return print_output(&serde_json::Value::Array(items), format);
        }
    }

    save_or_fail(console).await?;
    print_layout(console, format)
}

/// Local save after an edit; a failed save aborts with its toast message.
async fn save_or_fail(console: &mut Console) -> CliResult<()> {
    let ok = console.save(false).await;
    let toasts = console.take_toasts();
    if ok {
        return Ok(());
    }
    Err(last_message(&toasts).into())
}

fn finish(console: &mut Console, ok: bool, format: &OutputFormat) -> CliResult<()> {
    let toasts = console.take_toasts();
    for toast in &toasts {
        let level = match toast.tone {
            Tone::Error => "error",
            Tone::Warn => "warn",
            Tone::Info => "info",
            Tone::Success => "ok",
        };
        eprintln!("[{level}] {}: {}", toast.title, toast.message);
    }
    if !ok {
        return Err(last_message(&toasts).into());
    }
    let status = console
        .store()
        .active_page()
        .map(|p| p.status)
        .unwrap_or(PageStatus::Draft);
    print_output(
        &serde_json::json!({ "ok": true, "pageStatus": status.as_str() }),
        format,
    )
}

fn last_message(toasts: &[folio::console::Toast]) -> String {
    toasts
        .last()
        .map(|t| format!("{}: {}", t.title, t.message))
        .unwrap_or_else(|| "operation failed".to_string())
}

fn print_layout(console: &Console, format: &OutputFormat) -> CliResult<()> {
    let layout = console
        .store()
        .active_page()
        .map(|p| serde_json::to_value(&p.layout))
        .transpose()?
        .unwrap_or(serde_json::Value::Null);
    print_output(&layout, format)
}

fn print_output(value: &serde_json::Value, format: &OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}
