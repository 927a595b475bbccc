use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tagmend::pipeline::{process, Document, RuleOutcome};
use tagmend::scan::{tokenize, verify, BalanceMode};
use tagmend::{compile, load_from_path};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "tagmend")]
#[command(about = "Structural markup transformation engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a rule file to documents
    Apply {
        /// Path to the TOML rule file
        #[arg(short, long)]
        rules: PathBuf,

        /// Target files (or use --root to discover them)
        paths: Vec<PathBuf>,

        /// Root directory to walk for target files
        #[arg(long)]
        root: Option<PathBuf>,

        /// File extension filter when walking --root
        #[arg(long, default_value = "tsx")]
        ext: String,

        /// Dry run - report what would change without writing files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Judge terminal balance with name-checked (strict) verification
        #[arg(long)]
        strict: bool,
    },

    /// Verify tag balance of documents without transforming them
    Check {
        /// Target files (or use --root to discover them)
        paths: Vec<PathBuf>,

        /// Root directory to walk for target files
        #[arg(long)]
        root: Option<PathBuf>,

        /// File extension filter when walking --root
        #[arg(long, default_value = "tsx")]
        ext: String,

        /// Name-checked verification instead of count-only
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            rules,
            paths,
            root,
            ext,
            dry_run,
            diff,
            strict,
        } => cmd_apply(rules, paths, root, &ext, dry_run, diff, strict),

        Commands::Check {
            paths,
            root,
            ext,
            strict,
        } => cmd_check(paths, root, &ext, strict),
    }
}

/// Resolve the target document list: explicit paths win, otherwise walk
/// --root for files with the requested extension.
fn discover_documents(
    paths: Vec<PathBuf>,
    root: Option<PathBuf>,
    ext: &str,
) -> Result<Vec<PathBuf>> {
    if !paths.is_empty() {
        return Ok(paths);
    }

    let Some(root) = root else {
        anyhow::bail!("no target files given; pass file paths or --root <dir>");
    };

    let mut files = Vec::new();
    for entry in WalkDir::new(&root) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some(ext)
        {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();

    if files.is_empty() {
        anyhow::bail!("no .{} files found under {}", ext, root.display());
    }
    Ok(files)
}

fn read_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    paths
        .iter()
        .map(|path| {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(Document::new(path.display().to_string(), text))
        })
        .collect()
}

/// Atomic file write: tempfile + fsync + rename.
fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Show unified diff between original and transformed content.
fn display_diff(label: &str, original: &str, modified: &str) {
    println!("\n{}", format!("--- {label} (original)").dimmed());
    println!("{}", format!("+++ {label} (transformed)").dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn print_outcome(outcome: &RuleOutcome) {
    if outcome.applied {
        println!(
            "  {} {}: {} match{}",
            "✓".green(),
            outcome.rule_id,
            outcome.match_count,
            if outcome.match_count == 1 { "" } else { "es" }
        );
    } else if outcome.match_count == 0 {
        println!("  {} {}: no matches", "⊘".dimmed(), outcome.rule_id);
    } else {
        let offset = outcome
            .first_failure_offset
            .map(|o| format!(" at byte {o}"))
            .unwrap_or_default();
        println!(
            "  {} {}: rejected{} (balance {} -> {}), rolled back",
            "✗".red(),
            outcome.rule_id,
            offset,
            outcome.balance_before,
            outcome.balance_after
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_apply(
    rules_path: PathBuf,
    paths: Vec<PathBuf>,
    root: Option<PathBuf>,
    ext: &str,
    dry_run: bool,
    show_diff: bool,
    strict: bool,
) -> Result<()> {
    // Malformed configuration is fatal before any document is touched.
    let config = load_from_path(&rules_path)?;
    let rules = compile(&config)?;
    let mode = if strict {
        BalanceMode::Strict
    } else {
        BalanceMode::Loose
    };

    let targets = discover_documents(paths, root, ext)?;
    let documents = read_documents(&targets)?;

    if !config.meta.name.is_empty() {
        println!("Rule set: {}", config.meta.name);
    }
    println!("Rules: {} | Documents: {}", rules.len(), documents.len());
    if dry_run {
        println!("{}", "[DRY RUN - no files will be written]".cyan());
    }
    println!();

    let mut cleaned = 0;
    let mut unchanged = 0;
    let mut unbalanced = 0;

    let results = process(&documents, &rules);

    for (document, result) in documents.iter().zip(&results) {
        println!("{}", result.label.bold());
        for outcome in &result.report.outcomes {
            print_outcome(outcome);
        }

        let terminal = &result.report.terminal;
        if terminal.is_valid(mode) {
            println!("  balance: {}", "ok".green());
        } else {
            unbalanced += 1;
            println!(
                "  balance: {} (final depth {}, {} unclosed, {} mismatched)",
                "BROKEN".red().bold(),
                terminal.final_depth,
                terminal.unclosed.len(),
                terminal.mismatched.len()
            );
            for (tag, offset) in &terminal.unclosed {
                println!("    unclosed <{tag}> at byte {offset}");
            }
            for m in &terminal.mismatched {
                println!(
                    "    close </{}> at byte {} does not match open <{}>",
                    m.found, m.offset, m.expected
                );
            }
        }

        if result.final_text != document.text {
            cleaned += 1;
            if show_diff {
                display_diff(&result.label, &document.text, &result.final_text);
            }
            if !dry_run {
                atomic_write(Path::new(&result.label), &result.final_text)
                    .with_context(|| format!("failed to write {}", result.label))?;
            }
        } else {
            unchanged += 1;
        }
        println!();
    }

    println!("{}", "Summary:".bold());
    println!("  {} cleaned", format!("{cleaned}").green());
    println!("  {} unchanged", format!("{unchanged}").yellow());
    println!("  {} unbalanced", format!("{unbalanced}").red());

    if unbalanced > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_check(
    paths: Vec<PathBuf>,
    root: Option<PathBuf>,
    ext: &str,
    strict: bool,
) -> Result<()> {
    let mode = if strict {
        BalanceMode::Strict
    } else {
        BalanceMode::Loose
    };
    let targets = discover_documents(paths, root, ext)?;
    let documents = read_documents(&targets)?;

    let mut broken = 0;

    for document in &documents {
        let report = verify(&tokenize(&document.text));
        if report.is_valid(mode) {
            println!(
                "{} {}: balanced (depth 0)",
                "✓".green(),
                document.label
            );
            continue;
        }

        broken += 1;
        println!(
            "{} {}: final depth {}",
            "✗".red(),
            document.label,
            report.final_depth
        );
        if let Some(offset) = report.first_negative_offset {
            println!("    depth went negative at byte {offset}");
        }
        for (tag, offset) in &report.unclosed {
            println!("    unclosed <{tag}> at byte {offset}");
        }
        if strict {
            for m in &report.mismatched {
                println!(
                    "    close </{}> at byte {} does not match open <{}>",
                    m.found, m.offset, m.expected
                );
            }
        }
    }

    println!();
    if broken == 0 {
        println!("{}", "All documents balanced".green().bold());
        Ok(())
    } else {
        println!(
            "{}",
            format!("{broken} document(s) unbalanced").red().bold()
        );
        std::process::exit(1);
    }
}
