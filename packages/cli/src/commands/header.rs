use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::style;
use content::header::HEADERS_CACHE_KEY;
use content::{HeaderForm, PageHeader, PageKey, QueryCache};

use crate::client::{ApiClient, HeaderEntry};

#[derive(Subcommand, Debug)]
pub enum HeaderCommand {
    /// List every configured header
    List,
    /// Show one page's header, or the defaults when none is configured
    Get {
        /// One of home, courses, clinics, community, about, contact
        page: PageKey,
    },
    /// Edit a page's header; unspecified fields keep their stored values
    Set(SetArgs),
    /// Remove a page's header
    Delete { page: PageKey },
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// One of home, courses, clinics, community, about, contact
    pub page: PageKey,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub image_url: Option<String>,
    #[arg(long)]
    pub subtitle: Option<String>,
    #[arg(long)]
    pub padding_top: Option<String>,
    #[arg(long)]
    pub padding_bottom: Option<String>,
    #[arg(long)]
    pub min_height: Option<String>,
}

impl SetArgs {
    fn apply(self, draft: &mut PageHeader) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(image_url) = self.image_url {
            draft.image_url = image_url;
        }
        if let Some(subtitle) = self.subtitle {
            draft.subtitle = subtitle;
        }
        if let Some(padding_top) = self.padding_top {
            draft.padding_top = Some(padding_top);
        }
        if let Some(padding_bottom) = self.padding_bottom {
            draft.padding_bottom = Some(padding_bottom);
        }
        if let Some(min_height) = self.min_height {
            draft.min_height = Some(min_height);
        }
    }
}

pub async fn run(client: &ApiClient, command: HeaderCommand) -> Result<()> {
    let cache = QueryCache::new();
    match command {
        HeaderCommand::List => {
            let headers = cached_headers(client, &cache).await?;
            if headers.is_empty() {
                println!("{}", style("No headers configured").dim());
            }
            for entry in headers {
                print_header(&entry.page, &entry.header);
            }
            Ok(())
        }
        HeaderCommand::Get { page } => {
            let mut form = HeaderForm::new();
            form.select(client, page).await?;
            print_header(page.as_str(), form.draft());
            Ok(())
        }
        HeaderCommand::Set(args) => set(client, &cache, args).await,
        HeaderCommand::Delete { page } => {
            client.delete_header(page).await?;
            cache.invalidate_prefix(HEADERS_CACHE_KEY);
            println!("{} header for {page} removed", style("✔").green());
            Ok(())
        }
    }
}

async fn set(client: &ApiClient, cache: &QueryCache<Vec<HeaderEntry>>, args: SetArgs) -> Result<()> {
    if !client.has_token() {
        bail!("Saving a header needs a token (--token or PAGESMITH_TOKEN)");
    }
    let page = args.page;

    let mut form = HeaderForm::new();
    form.select(client, page).await?;
    args.apply(form.draft_mut());

    if let Err(e) = form.submit(client, cache).await {
        for error in form.errors() {
            eprintln!("{} {}: {}", style("✘").red(), error.field, error.message);
        }
        return Err(e.into());
    }

    let saved = cached_headers(client, cache)
        .await?
        .into_iter()
        .find(|entry| entry.page == page.as_str());
    println!("{} header for {page} saved", style("✔").green());
    if let Some(entry) = saved {
        print_header(&entry.page, &entry.header);
    }
    Ok(())
}

async fn cached_headers(
    client: &ApiClient,
    cache: &QueryCache<Vec<HeaderEntry>>,
) -> Result<Vec<HeaderEntry>> {
    cache
        .get_or_fetch(HEADERS_CACHE_KEY, || client.list_headers())
        .await
}

fn print_header(page: &str, header: &PageHeader) {
    println!("{}", style(page).bold().cyan());
    println!("  title:     {}", header.title);
    println!("  subtitle:  {}", header.subtitle);
    println!("  image_url: {}", header.image_url);
    for (label, value) in [
        ("padding_top", &header.padding_top),
        ("padding_bottom", &header.padding_bottom),
        ("min_height", &header.min_height),
    ] {
        if let Some(value) = value {
            println!("  {label}: {value}");
        }
    }
}
