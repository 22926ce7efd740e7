//! # chatzip CLI
//!
//! Command-line interface for the chatzip library.

use std::collections::HashMap;
use std::process;
use std::time::Instant;

use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

use chatzip::cli::{Args, Command, ListArgs, MediaArgs, SplitArgs};
use chatzip::format::{OutputFormat, to_format_string, write_to_format};
use chatzip::progress::stderr_progress;
use chatzip::session::ChatSession;
use chatzip::{ChatzipError, Message};

fn main() {
    let args = <Args as ClapParser>::parse();
    init_tracing(&args);

    if let Err(e) = run(&args) {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

/// Installs the log subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<(), ChatzipError> {
    let mut session = ChatSession::with_config(args.viewer_config());
    match args.command {
        Command::List(ref list) => run_list(&mut session, list),
        Command::Split(ref split) => run_split(&mut session, split),
        Command::Media(ref media) => run_media(&mut session, media),
    }
}

fn load(session: &mut ChatSession, path: &str) -> Result<(), ChatzipError> {
    let start = Instant::now();
    let loaded = session.load_file(path)?;
    eprintln!(
        "📦 {}: {} messages, {} media ({:.2}s)",
        loaded.name(),
        loaded.messages().len(),
        loaded.index().media().len(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn run_list(session: &mut ChatSession, args: &ListArgs) -> Result<(), ChatzipError> {
    let filter = args.filter_config()?;
    load(session, &args.archive)?;

    let selected: Vec<Message> = session.filter(&filter).into_iter().cloned().collect();
    let format: OutputFormat = args.format.into();
    let output_config = args.output_config();

    match args.output {
        Some(ref path) => {
            write_to_format(&selected, path, format, &output_config)?;
            eprintln!("💾 Wrote {} messages to {} ({})", selected.len(), path, format);
        }
        None => print!("{}", to_format_string(&selected, format, &output_config)?),
    }

    if filter.is_active() {
        eprintln!(
            "🔍 {} of {} messages matched",
            selected.len(),
            session.messages().len()
        );
    }
    if let Some(owner) = session.owner_name() {
        let own = selected.iter().filter(|m| session.is_own(m)).count();
        eprintln!("👤 Owner: {} ({} own messages)", owner, own);
    }
    Ok(())
}

fn run_split(session: &mut ChatSession, args: &SplitArgs) -> Result<(), ChatzipError> {
    let options = args.options()?;
    load(session, &args.archive)?;

    println!("✂️  Range:   {} .. {}", options.start(), options.end());
    let start = Instant::now();
    let progress = args.progress.then(stderr_progress);
    let outcome = session.split_with_progress(&options, progress.as_ref())?;

    let stats = &outcome.stats;
    if stats.is_empty_selection() {
        println!("⚠️  No messages fall inside the range");
    }
    for skipped in &stats.skipped_media {
        println!("⏭️  Skipped {}: {}", skipped.name, skipped.reason);
    }

    let output = match args.output {
        Some(ref path) => path.clone(),
        None => session
            .split_file_name(&options)
            .ok_or(ChatzipError::NotLoaded)?,
    };
    std::fs::write(&output, &outcome.bytes)?;

    println!();
    println!("✅ Done! Split saved to {}", output);
    println!("📊 Summary:");
    println!("   Messages:     {}", stats.selected_messages);
    println!("   Transcripts:  {}", stats.transcripts_written);
    println!("   Media:        {}", stats.media_written);
    println!("   Size:         {} bytes", outcome.bytes.len());
    println!("   Time:         {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn run_media(session: &mut ChatSession, args: &MediaArgs) -> Result<(), ChatzipError> {
    load(session, &args.archive)?;
    let Some(loaded) = session.archive() else {
        return Err(ChatzipError::NotLoaded);
    };

    let mut references: HashMap<&str, usize> = HashMap::new();
    for msg in loaded.messages() {
        for attachment in msg.attachments() {
            *references.entry(attachment.filename.as_str()).or_default() += 1;
        }
    }

    for entry in loaded.index().transcripts() {
        println!("📄 transcript  {}", entry.path);
    }
    for entry in loaded.index().media() {
        if args.linked {
            let count = references.get(entry.basename()).copied().unwrap_or(0);
            println!("🗂️  {:<9} {}  ({} refs)", entry.kind().as_str(), entry.path, count);
        } else {
            println!("🗂️  {:<9} {}", entry.kind().as_str(), entry.path);
        }
    }

    let unlinked = loaded
        .index()
        .media()
        .iter()
        .filter(|entry| !references.contains_key(entry.basename()))
        .count();
    println!();
    println!(
        "📊 {} media, {} referenced, {} unreferenced",
        loaded.index().media().len(),
        loaded.index().media().len() - unlinked,
        unlinked
    );
    Ok(())
}
