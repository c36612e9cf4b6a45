use anyhow::{bail, Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tfc_bug_report::{Bug, BugReport, BugReportReader};
use tfc_code_chunker::{Chunk, ChunkPlanStats, Chunker, ChunkerConfig};
use tfc_fix_workflow::{
    acquire_report, AnalysisRequest, AnalysisTarget, BugOutcome, FixPolicy, FixSession,
    FixWorkflow, ReportSource, RunSummary, SessionObserver, SilentObserver,
};

use crate::aider::AiderPatchService;
use crate::analyzer::ExternalBugAnalyzer;
use crate::config::ToolConfig;
use crate::flags::{batch_policy, triage_policy, ThresholdFlag};
use crate::git::GitCli;
use crate::render::TerminalObserver;

mod aider;
mod analyzer;
mod config;
mod flags;
mod git;
mod prompt;
mod render;

const DEFAULT_REPORT_PATH: &str = "bug_analysis_report.xml";

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "tfc")]
#[command(about = "Chunk source trees and triage bug-analysis reports", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging and verbose tool output
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover source files and print the chunk plan
    Chunks(ChunksArgs),

    /// Analyze, then apply every fix without asking
    #[command(name = "fix-bugs")]
    FixBugs(FixBugsArgs),

    /// Analyze, then triage each bug interactively or by policy
    #[command(name = "find-bugs-and-fix")]
    FindBugsAndFix(FindBugsAndFixArgs),

    /// Analyze and list bugs; exit 1 when any bug meets the thresholds
    #[command(name = "find-bugs-and-report")]
    FindBugsAndReport(FindBugsAndReportArgs),
}

#[derive(Args)]
struct ChunksArgs {
    /// Project directory to scan
    #[arg(long, short = 'd', default_value = ".")]
    directory: PathBuf,

    /// Smallest chunk worth sending on its own
    #[arg(long, default_value_t = tfc_code_chunker::DEFAULT_MIN_FILES)]
    min_files: usize,

    /// Largest chunk allowed
    #[arg(long, default_value_t = tfc_code_chunker::DEFAULT_MAX_FILES)]
    max_files: usize,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,
}

/// Where the report comes from; shared by every report command
#[derive(Args)]
struct AnalyzerArgs {
    /// Repository to analyze and patch
    #[arg(long, short = 'd', default_value = ".")]
    directory: PathBuf,

    /// Report path written by the analyzer (or read with --skip-bug-analyzer)
    #[arg(long, short = 'o', default_value = DEFAULT_REPORT_PATH)]
    output: PathBuf,

    /// Reuse an existing report instead of running the analyzer
    #[arg(long)]
    skip_bug_analyzer: bool,

    /// Analyze uncommitted changes
    #[arg(long)]
    working_tree: bool,

    /// Analyze one commit (defaults to HEAD); overrides --working-tree
    #[arg(long)]
    commit: Option<String>,
}

impl AnalyzerArgs {
    fn target(&self) -> AnalysisTarget {
        match (&self.commit, self.working_tree) {
            (Some(id), _) => AnalysisTarget::Commit(id.clone()),
            (None, true) => AnalysisTarget::WorkingTree,
            (None, false) => AnalysisTarget::Commit("HEAD".to_string()),
        }
    }

    fn source(&self, debug: bool) -> ReportSource {
        if self.skip_bug_analyzer {
            ReportSource::Existing(self.output.clone())
        } else {
            ReportSource::Analyze {
                request: AnalysisRequest::new(&self.directory, self.target()).with_debug(debug),
                output: self.output.clone(),
            }
        }
    }
}

#[derive(Args)]
struct FixBugsArgs {
    #[command(flatten)]
    analyzer: AnalyzerArgs,

    /// Commit each fix after applying it
    #[arg(long)]
    auto_commit: bool,

    /// File holding one bare <bug> element; it is wrapped into --output and
    /// fixed without running the analyzer
    #[arg(long, value_name = "FILE", conflicts_with = "skip_bug_analyzer")]
    single_bug_xml: Option<PathBuf>,

    /// Print the session summary as JSON
    #[arg(long)]
    json: bool,
}

impl FixBugsArgs {
    fn source(&self, debug: bool) -> ReportSource {
        match &self.single_bug_xml {
            Some(bug_xml) => ReportSource::SingleBug {
                bug_xml: bug_xml.clone(),
                output: self.analyzer.output.clone(),
            },
            None => self.analyzer.source(debug),
        }
    }
}

#[derive(Args)]
struct FindBugsAndFixArgs {
    #[command(flatten)]
    analyzer: AnalyzerArgs,

    /// Never prompt; apply every fix unless another --auto-* flag says otherwise
    #[arg(long)]
    no_interactive: bool,

    /// Apply every fix without asking
    #[arg(long, conflicts_with_all = ["auto_skip", "auto_commit"])]
    auto_apply: bool,

    /// Skip every fix without asking
    #[arg(long, conflicts_with = "auto_commit")]
    auto_skip: bool,

    /// Apply and commit every fix without asking
    #[arg(long)]
    auto_commit: bool,

    /// Print the session summary as JSON (requires a non-interactive policy)
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct FindBugsAndReportArgs {
    #[command(flatten)]
    analyzer: AnalyzerArgs,

    /// Lowest severity that fails the run
    #[arg(long, value_enum, default_value = "high")]
    severity_threshold: ThresholdFlag,

    /// Lowest confidence that fails the run
    #[arg(long, value_enum, default_value = "high")]
    confidence_threshold: ThresholdFlag,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct SessionOutput<'a> {
    policy: String,
    summary: RunSummary,
    bugs: Vec<BugEntry<'a>>,
}

#[derive(Serialize)]
struct BugEntry<'a> {
    location: String,
    #[serde(flatten)]
    outcome: &'a BugOutcome,
}

#[derive(Serialize)]
struct ChunkPlanOutput<'a> {
    chunks: &'a [Chunk],
    stats: &'a ChunkPlanStats,
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    total: usize,
    blocking: usize,
    bugs: &'a [Bug],
}

pub fn main_entry() -> Result<ExitCode> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers
    let json_output = match &cli.command {
        Commands::Chunks(args) => args.json,
        Commands::FixBugs(args) => args.json,
        Commands::FindBugsAndFix(args) => args.json,
        Commands::FindBugsAndReport(args) => args.json,
    };
    if json_output && !cli.debug {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let tools = ToolConfig::from_env();

    match cli.command {
        Commands::Chunks(args) => run_chunks(args),
        Commands::FixBugs(args) => {
            let policy = batch_policy(args.auto_commit);
            let source = args.source(cli.debug);
            run_session(&args.analyzer, &source, policy, args.json, cli.debug, cli.quiet, &tools)
        }
        Commands::FindBugsAndFix(args) => {
            let policy = triage_policy(
                args.no_interactive,
                args.auto_apply,
                args.auto_skip,
                args.auto_commit,
            );
            if args.json && policy.is_interactive() {
                bail!("--json needs a non-interactive policy (--no-interactive or an --auto-* flag)");
            }
            let source = args.analyzer.source(cli.debug);
            run_session(&args.analyzer, &source, policy, args.json, cli.debug, cli.quiet, &tools)
        }
        Commands::FindBugsAndReport(args) => run_report(args, cli.debug, cli.quiet, &tools),
    }
}

fn run_chunks(args: ChunksArgs) -> Result<ExitCode> {
    let chunker = Chunker::new(ChunkerConfig::new(args.min_files, args.max_files))
        .context("Invalid chunk bounds")?;
    let files = tfc_discovery::discover(&args.directory)
        .with_context(|| format!("Failed to scan {}", args.directory.display()))?;

    // Paths relative to the scanned root read better and chunk the same way
    let relative: Vec<PathBuf> = files
        .iter()
        .map(|path| {
            path.strip_prefix(&args.directory)
                .map_or_else(|_| path.clone(), PathBuf::from)
        })
        .collect();

    let chunks = chunker.chunk(relative);
    let stats = Chunker::get_stats(&chunks);
    log::info!(
        "Planned {} chunk(s) for {} file(s)",
        stats.total_chunks,
        stats.total_files
    );

    if args.json {
        let output = ChunkPlanOutput {
            chunks: &chunks,
            stats: &stats,
        };
        print_stdout(&serde_json::to_string_pretty(&output)?)?;
    } else {
        print_stdout(&render::chunk_plan(&chunks, &stats))?;
    }
    Ok(ExitCode::SUCCESS)
}

fn obtain_report(
    args: &AnalyzerArgs,
    source: &ReportSource,
    quiet: bool,
    tools: &ToolConfig,
) -> Result<BugReport> {
    let vcs = GitCli::new(tools.git.clone(), &args.directory);
    let analyzer = ExternalBugAnalyzer::new(tools.bug_analyzer.clone(), !quiet);

    let report = acquire_report(source, &BugReportReader::new(), &analyzer, &vcs)
        .with_context(|| {
            format!(
                "Failed to obtain bug report {}",
                source.report_path().display()
            )
        })?;
    log::info!(
        "Loaded {} report with {} bug(s) in {} file(s)",
        report.origin,
        report.len(),
        report.affected_files().len()
    );
    Ok(report)
}

fn run_session(
    args: &AnalyzerArgs,
    source: &ReportSource,
    policy: FixPolicy,
    json: bool,
    debug: bool,
    quiet: bool,
    tools: &ToolConfig,
) -> Result<ExitCode> {
    let report = obtain_report(args, source, quiet, tools)?;
    if report.is_empty() && !json {
        print_stdout("No bugs found.")?;
        return Ok(ExitCode::SUCCESS);
    }

    let vcs = GitCli::new(tools.git.clone(), &args.directory);
    let patcher = AiderPatchService::new(tools.aider.clone(), &args.directory, debug);
    let observer: &dyn SessionObserver = if json {
        &SilentObserver
    } else {
        &TerminalObserver
    };
    let workflow = FixWorkflow::new(&patcher, &vcs).with_observer(observer);

    let session = if policy.is_interactive() {
        let mut prompt = prompt::choose_prompt();
        workflow.run(report, policy, Some(prompt.as_mut()))?
    } else {
        workflow.run(report, policy, None)?
    };

    print_session(&session, json)?;
    Ok(ExitCode::SUCCESS)
}

fn print_session(session: &FixSession, json: bool) -> Result<()> {
    let summary = session.summary();
    if json {
        let output = SessionOutput {
            policy: session.policy().to_string(),
            summary,
            bugs: session
                .entries()
                .map(|(bug, outcome)| BugEntry {
                    location: bug.location(),
                    outcome,
                })
                .collect(),
        };
        return print_stdout(&serde_json::to_string_pretty(&output)?);
    }
    print_stdout(&render::summary(&summary))
}

fn run_report(
    args: FindBugsAndReportArgs,
    debug: bool,
    quiet: bool,
    tools: &ToolConfig,
) -> Result<ExitCode> {
    let source = args.analyzer.source(debug);
    let report = obtain_report(&args.analyzer, &source, quiet, tools)?;
    let severity = args.severity_threshold.as_severity();
    let confidence = args.confidence_threshold.as_confidence();
    let blocking = report.meeting(severity, confidence).count();

    if args.json {
        let output = ReportOutput {
            total: report.len(),
            blocking,
            bugs: &report.bugs,
        };
        print_stdout(&serde_json::to_string_pretty(&output)?)?;
    } else if report.is_empty() {
        print_stdout("No bugs found.")?;
    } else {
        let lines: Vec<String> = report
            .bugs
            .iter()
            .enumerate()
            .map(|(idx, bug)| render::bug_line(idx, bug))
            .collect();
        print_stdout(&lines.join("\n"))?;
        print_stdout(&format!(
            "{blocking} of {} bug(s) at or above severity {severity} and confidence {confidence}",
            report.len()
        ))?;
    }

    if blocking > 0 {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}
