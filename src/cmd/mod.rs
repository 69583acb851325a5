use anyhow::Result;
use async_trait::async_trait;

pub mod daemon;
pub mod sources;

#[async_trait]
pub trait Command {
    async fn run(&self) -> Result<()>;
}

pub trait IntoCommand {
    fn into_command(self) -> Box<dyn Command>;
}

impl IntoCommand for crate::cli::GlobalSubcommand {
    fn into_command(self) -> Box<dyn Command> {
        match self {
            crate::cli::GlobalSubcommand::Daemon(daemon_options) => {
                Box::new(daemon::DaemonCommand { daemon_options })
            }
            crate::cli::GlobalSubcommand::Sources(sources_options) => {
                Box::new(sources::SourcesCommand { sources_options })
            }
        }
    }
}
