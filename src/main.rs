use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::Command;

use eyre::{Result, bail};
use log::{info, warn};

mod cli;

use cli::{Cli, OutputFormat};
use ytsum::config::{Config, config_path};
use ytsum::generate::{DEFAULT_MODEL, LlmClient};
use ytsum::output::{render_error, render_json, render_text};
use ytsum::pipeline::{Pipeline, RunError, Settings};
use ytsum::timestamps::DEFAULT_MAX_DESCRIPTION_LENGTH;
use ytsum::transcript::Cascade;
use ytsum::ytdlp::DEFAULT_BINARY;
use ytsum::{LanguagePreference, VideoId, title};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytsum")
        .join("logs")
}

fn tool_version(name: &str) -> Option<String> {
    Command::new(name)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

fn build_after_help() -> String {
    let yt_dlp_line = match tool_version(DEFAULT_BINARY) {
        Some(v) => format!("  \x1b[32m✅\x1b[0m yt-dlp     {v}"),
        None => "  \x1b[31m❌\x1b[0m yt-dlp     (not found, needed for the last transcript fallback)".to_string(),
    };

    let log_path = log_dir().join("ytsum.log");

    format!(
        "\nOPTIONAL TOOLS:\n{yt_dlp_line}\n\nAPI KEYS (by --model):\n  gemini-*   GOOGLE_GEMINI_API_KEY\n  claude-*   ANTHROPIC_API_KEY\n  gpt-*/o*   OPENAI_API_KEY\n\nLogs are written to: {}",
        log_path.display()
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config file {}: {e}", config_path().display());
        Config::default()
    });

    // CLI flags take priority over config
    let mode = cli.mode.or(config.default_mode).unwrap_or_default();
    let model = cli
        .model
        .clone()
        .or_else(|| config.default_model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let language: LanguagePreference = cli
        .lang
        .as_deref()
        .or(config.default_lang.as_deref())
        .unwrap_or_default()
        .parse()
        .unwrap_or_default();
    let ytdlp = cli
        .ytdlp
        .clone()
        .or_else(|| config.ytdlp_path.clone())
        .unwrap_or_else(|| DEFAULT_BINARY.to_string());

    let settings = Settings {
        language,
        hyperlink: !cli.no_links && config.hyperlink.unwrap_or(true),
        enhance: cli.enhance,
        max_description_length: config.max_description_length.unwrap_or(DEFAULT_MAX_DESCRIPTION_LENGTH),
        paragraphs: config.paragraph_settings(),
    };

    if cli.verbose {
        let path = config_path();
        if path.exists() {
            eprintln!("Config: {}", path.display());
        }
        eprintln!("Mode: {mode}\nModel: {model}\nLanguage: {}", settings.language);
    }

    let client = reqwest::Client::builder().timeout(config.request_timeout()).build()?;
    let cascade = Cascade::standard(client.clone(), &ytdlp, config.tool_timeout());
    if cli.verbose {
        let order: Vec<String> = cascade.strategies().iter().map(|s| s.to_string()).collect();
        eprintln!("Strategies: {}", order.join(" -> "));
    }
    let pipeline = Pipeline::new(cascade, LlmClient::new(client.clone(), model));

    // Collect URLs: from arg or stdin
    let urls = if let Some(ref url) = cli.url {
        vec![url.clone()]
    } else {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };

    let urls: Vec<&str> = urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()).collect();
    if urls.is_empty() {
        bail!("no URL or video ID provided\n\nUsage: ytsum <URL>\n       echo <URL> | ytsum");
    }

    let mut outputs = Vec::new();
    let mut failures = 0;

    for url_input in &urls {
        let result = match VideoId::resolve(url_input) {
            Some(video_id) => pipeline.run_for(&video_id, mode, &settings).await,
            None => Err(RunError::InvalidUrl(url_input.to_string())),
        };

        let mut rendered = match result {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!("Request for {url_input} failed: {e}");
                eprintln!("{}", render_error(e));
                failures += 1;
                continue;
            }
        };

        rendered.title = Some(title::fetch_title(&client, &rendered.video_id).await);

        if cli.verbose {
            eprintln!(
                "Video: {} ({})\nSource: {}",
                rendered.title.as_deref().unwrap_or_default(),
                rendered.video_id,
                rendered.source,
            );
        }

        outputs.push(match cli.format {
            OutputFormat::Text => render_text(&rendered),
            OutputFormat::Json => render_json(&rendered)?,
        });
    }

    if !outputs.is_empty() {
        let joined = outputs.join("\n\n");
        if let Some(ref path) = cli.output {
            std::fs::write(path, &joined)?;
            if cli.verbose {
                eprintln!("Output written to: {}", path.display());
            }
        } else {
            println!("{joined}");
        }
    }

    if failures > 0 {
        bail!("{failures} of {} request(s) failed", urls.len());
    }

    Ok(())
}
