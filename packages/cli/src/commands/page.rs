use anyhow::{Result, bail};
use clap::Subcommand;
use console::style;
use content::resolve::PageSession;
use content::{DocumentMeta, PageView};

use crate::client::ApiClient;

#[derive(Subcommand, Debug)]
pub enum PageCommand {
    /// Resolve a published page and print its document metadata and markup
    Show {
        /// Page slug
        slug: String,
        /// Print only the rendered block markup
        #[arg(long)]
        html_only: bool,
    },
    /// List pages, published or not (needs a token)
    List {
        /// Case-insensitive search over title and slug
        #[arg(short, long)]
        search: Option<String>,
        /// Result page (1-based)
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
}

pub async fn run(client: &ApiClient, command: PageCommand) -> Result<()> {
    match command {
        PageCommand::Show { slug, html_only } => show(client, &slug, html_only).await,
        PageCommand::List { search, page } => list(client, search.as_deref(), page).await,
    }
}

async fn show(client: &ApiClient, slug: &str, html_only: bool) -> Result<()> {
    let session = PageSession::new(DocumentMeta::new("Pagesmith", None));
    session.navigate(client, slug).await;

    match session.view() {
        PageView::Ready(ready) => {
            if !html_only {
                let meta = session.meta();
                println!("{} {}", style("title:").bold(), meta.title);
                if let Some(description) = meta.description {
                    println!("{} {}", style("description:").bold(), description);
                }
                println!(
                    "{} {} top-level, {} total",
                    style("blocks:").bold(),
                    ready.blocks.roots().len(),
                    ready.blocks.len()
                );
                println!();
            }
            for markup in ready.render() {
                println!("{markup}");
            }
            Ok(())
        }
        PageView::NotFound => bail!("No published page with slug '{slug}'"),
        PageView::Error(e) => bail!("Page '{slug}' could not be loaded: {e}"),
        PageView::Loading => bail!("Page '{slug}' is still loading"),
    }
}

async fn list(client: &ApiClient, search: Option<&str>, page: u64) -> Result<()> {
    if !client.has_token() {
        bail!("Listing pages needs a token (--token or PAGESMITH_TOKEN)");
    }
    let body = client.list_pages(search, page).await?;

    let rows = body["data"].as_array().cloned().unwrap_or_default();
    if rows.is_empty() {
        println!("{}", style("No pages found").dim());
        return Ok(());
    }
    for row in rows {
        let published = row["published"].as_bool().unwrap_or(false);
        let state = if published {
            style("published").green()
        } else {
            style("draft").yellow()
        };
        println!(
            "{:>5}  {:<32}  {:<10}  {}",
            row["id"].as_i64().unwrap_or_default(),
            row["slug"].as_str().unwrap_or_default(),
            state,
            row["title"].as_str().unwrap_or_default()
        );
    }
    let pagination = &body["pagination"];
    println!(
        "{}",
        style(format!(
            "page {} of {} ({} total)",
            pagination["page"], pagination["total_pages"], pagination["total"]
        ))
        .dim()
    );
    Ok(())
}
