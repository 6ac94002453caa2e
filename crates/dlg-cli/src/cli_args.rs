use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "dlg-cli")]
#[command(about = "Branching dialogue player and authoring CLI")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Agent(AgentArgs),
    Play(PlayArgs),
    Inspect(InspectArgs),
    Lint(LintArgs),
    FindText(FindTextArgs),
    ReplaceText(ReplaceTextArgs),
}

/// Dialogue file plus the optional files that configure loading and participants.
#[derive(Debug, Clone, Args)]
pub(crate) struct SourceArgs {
    #[arg(long = "dialogue")]
    pub(crate) dialogue: String,
    #[arg(long = "participants")]
    pub(crate) participants: Option<String>,
    #[arg(long = "settings")]
    pub(crate) settings: Option<String>,
    #[arg(long = "classes")]
    pub(crate) classes: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub(crate) struct StartSelection {
    #[arg(long = "start-index")]
    pub(crate) start_index: Option<usize>,
    #[arg(long = "branch-tag")]
    pub(crate) branch_tag: Option<String>,
    #[arg(long = "seed")]
    pub(crate) seed: Option<u32>,
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Choose(ChooseArgs),
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    #[command(flatten)]
    pub(crate) start: StartSelection,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ChooseArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "choice")]
    pub(crate) choice: usize,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    #[command(flatten)]
    pub(crate) start: StartSelection,
    #[arg(long = "state-file")]
    pub(crate) state_file: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct InspectArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

#[derive(Debug, Args)]
pub(crate) struct LintArgs {
    #[arg(long = "dir")]
    pub(crate) dir: String,
    #[arg(long = "settings")]
    pub(crate) settings: Option<String>,
    #[arg(long = "classes")]
    pub(crate) classes: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct FindTextArgs {
    #[arg(long = "dialogue")]
    pub(crate) dialogue: String,
    #[arg(long = "text")]
    pub(crate) text: String,
    #[arg(long = "exact")]
    pub(crate) exact: bool,
}

#[derive(Debug, Args)]
pub(crate) struct ReplaceTextArgs {
    #[arg(long = "dialogue")]
    pub(crate) dialogue: String,
    #[arg(long = "find")]
    pub(crate) find: String,
    #[arg(long = "replace")]
    pub(crate) replace: String,
    #[arg(long = "exact")]
    pub(crate) exact: bool,
    /// Defaults to overwriting the input file.
    #[arg(long = "out")]
    pub(crate) out: Option<String>,
}
