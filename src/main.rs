use clap::{Parser, Subcommand};
use jingtong_site::catalog::{Catalog, RELATED_LIMIT};
use jingtong_site::contact::{ContactError, ContactHandler, ContactResponse, Submission};
use jingtong_site::sitemap::Sitemap;
use jingtong_site::{config, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jingtong-site")]
#[command(about = "Content catalog and contact handling for the Jing Tong Visa website")]
#[command(long_about = "\
Content catalog and contact handling for the Jing Tong Visa website

Articles are markdown/MDX files with YAML front matter. The file stem is the
slug; translations live in a subdirectory named after the locale.

Site structure:

  site/
  ├── config.toml                              # Optional, overrides stock defaults
  └── content/news/
      ├── china-visa-requirements-2025.mdx     # Default-locale article
      └── zh/
          └── china-visa-requirements-2025.mdx # Chinese translation

Locale fallback: a locale without a translation is served the default-locale
file. Unknown locales are treated as the default.

Contact mail is sent when the variable named by contact.api_key_env (default
RESEND_API_KEY) is set; otherwise submissions are logged.

Run 'jingtong-site gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site root (holds config.toml and the content directory)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Locale selection shared by catalog commands.
#[derive(clap::Args, Clone)]
struct LocaleArgs {
    /// Requested locale; unknown values fall back to the default locale
    #[arg(long, short)]
    locale: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Print every article slug
    Slugs,
    /// List articles, newest first
    List {
        #[command(flatten)]
        locale: LocaleArgs,
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one article
    Show {
        slug: String,
        #[command(flatten)]
        locale: LocaleArgs,
        /// Print the full record as JSON
        #[arg(long, conflicts_with = "html")]
        json: bool,
        /// Print the body rendered as HTML
        #[arg(long)]
        html: bool,
    },
    /// List articles in the same category
    Related {
        slug: String,
        #[command(flatten)]
        locale: LocaleArgs,
        #[arg(long, default_value_t = RELATED_LIMIT)]
        limit: usize,
    },
    /// Write the sitemap XML (stdout unless --out is given)
    Sitemap {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Submit a contact form payload
    Contact(ContactArgs),
    /// Audit the content tree for orphaned or unreadable files
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ContactArgs {
    /// JSON payload file ('-' for stdin); flags override its fields
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    message: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    wechat: Option<String>,
    #[arg(long)]
    visa_type: Option<String>,
    #[arg(long)]
    state: Option<String>,
    /// Print the HTTP-style response body as JSON
    #[arg(long)]
    json: bool,
}

impl ContactArgs {
    /// Raw JSON payload from `--file`, if any.
    fn payload(&self) -> std::io::Result<Option<String>> {
        match &self.file {
            Some(path) if path == Path::new("-") => {
                std::io::read_to_string(std::io::stdin()).map(Some)
            }
            Some(path) => std::fs::read_to_string(path).map(Some),
            None => Ok(None),
        }
    }

    fn submission(&self, payload: Option<&str>) -> Result<Submission, ContactError> {
        let mut submission = match payload {
            Some(body) => Submission::from_json(body)?,
            None => Submission::default(),
        };
        let overrides = [
            (&mut submission.name, &self.name),
            (&mut submission.email, &self.email),
            (&mut submission.message, &self.message),
            (&mut submission.phone, &self.phone),
            (&mut submission.wechat, &self.wechat),
            (&mut submission.visa_type, &self.visa_type),
            (&mut submission.state, &self.state),
        ];
        for (field, value) in overrides {
            if value.is_some() {
                field.clone_from(value);
            }
        }
        Ok(submission)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(())
        }
        command => run(command, &cli.root),
    }
}

fn run(command: Command, root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let site_config = config::load_config(root)?;
    let catalog = Catalog::from_config(&site_config, root);
    let locale_of = |args: &LocaleArgs| -> String {
        let requested = args.locale.as_deref().unwrap_or_default();
        catalog.locales().resolve(requested).to_string()
    };

    match command {
        Command::Slugs => {
            output::print_slugs(&catalog.list_slugs()?);
        }
        Command::List { locale, json } => {
            let locale = locale_of(&locale);
            let articles = catalog.all_articles(&locale)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&articles)?);
            } else {
                output::print_listing(&articles, &locale);
            }
        }
        Command::Show {
            slug,
            locale,
            json,
            html,
        } => {
            let locale = locale_of(&locale);
            let Some(article) = catalog.article(&slug, &locale)? else {
                return Err(format!("article not found: {slug}").into());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&article)?);
            } else if html {
                print!("{}", article.body_html());
            } else {
                output::print_article(&article, &locale);
            }
        }
        Command::Related {
            slug,
            locale,
            limit,
        } => {
            let locale = locale_of(&locale);
            let related = catalog.related(&slug, &locale, limit)?;
            output::print_related(&slug, &related, &locale);
        }
        Command::Sitemap { out } => {
            let sitemap = Sitemap::build(&catalog, &site_config.site)?;
            let xml = sitemap.to_xml();
            match out {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, xml)?;
                    for line in output::format_sitemap_summary(&sitemap, &path) {
                        println!("{}", line);
                    }
                }
                None => println!("{}", xml),
            }
        }
        Command::Contact(args) => {
            let handler = ContactHandler::from_config(&site_config.contact)?;
            let payload = args.payload()?;
            let result = args
                .submission(payload.as_deref())
                .and_then(|s| handler.handle(&s));
            if args.json {
                let response = ContactResponse::from_result(&result);
                println!("{}", serde_json::to_string(&response)?);
                if response.status != 200 {
                    return Err(format!("contact submission rejected ({})", response.status).into());
                }
            } else {
                output::print_acknowledgement(result?, &site_config.contact.recipient);
            }
        }
        Command::Check => {
            println!("==> Checking {}", catalog.dir().display());
            let report = catalog.check()?;
            output::print_check_report(&report, catalog.dir());
            if !report.is_clean() {
                return Err("content tree has unreachable files".into());
            }
            println!("==> Content is valid");
        }
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }

    Ok(())
}
