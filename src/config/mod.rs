pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::{SecretString, TomlConfig};

#[cfg(feature = "cli")]
mod cli {
    use super::{SecretString, TomlConfig};
    use crate::domain::model::ListPurpose;
    use crate::utils::error::Result;
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "bsky-list-migrator")]
    #[command(about = "Copy the members of a Bluesky list to a new list on another account")]
    pub struct CliConfig {
        #[arg(long, short, help = "TOML config file; flags override its values")]
        pub config: Option<PathBuf>,

        #[arg(long, help = "PDS URL of the source account [default: https://bsky.social]")]
        pub source_service: Option<String>,

        #[arg(long)]
        pub source_handle: Option<String>,

        #[arg(long, help = "App Password of the source account, never the main password")]
        pub source_password: Option<SecretString>,

        #[arg(long, help = "at:// URI or bsky.app URL of the list to copy")]
        pub source_list: Option<String>,

        #[arg(long, help = "PDS URL of the destination account [default: https://bsky.social]")]
        pub dest_service: Option<String>,

        #[arg(long)]
        pub dest_handle: Option<String>,

        #[arg(long, help = "App Password of the destination account, never the main password")]
        pub dest_password: Option<SecretString>,

        #[arg(long, help = "Name of the new list (max 64 characters)")]
        pub list_name: Option<String>,

        #[arg(long, help = "Description of the new list (max 300 characters)")]
        pub list_description: Option<String>,

        #[arg(long, value_enum)]
        pub list_purpose: Option<ListPurpose>,

        #[arg(long)]
        pub page_delay_ms: Option<u64>,

        #[arg(long)]
        pub success_delay_ms: Option<u64>,

        #[arg(long)]
        pub failure_delay_ms: Option<u64>,

        #[arg(long)]
        pub timeout_seconds: Option<u64>,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON")]
        pub json_logs: bool,
    }

    fn overlay<T: Clone>(target: &mut Option<T>, flag: &Option<T>) {
        if let Some(value) = flag {
            *target = Some(value.clone());
        }
    }

    impl CliConfig {
        /// 載入設定檔 (若有)，再以命令列參數覆蓋
        pub fn resolve(&self) -> Result<TomlConfig> {
            let mut config = match &self.config {
                Some(path) => {
                    tracing::debug!("Loading config file {}", path.display());
                    TomlConfig::from_file(path)?
                }
                None => TomlConfig::default(),
            };

            overlay(&mut config.source.service, &self.source_service);
            overlay(&mut config.source.handle, &self.source_handle);
            overlay(&mut config.source.app_password, &self.source_password);
            overlay(&mut config.source.list, &self.source_list);

            overlay(&mut config.destination.service, &self.dest_service);
            overlay(&mut config.destination.handle, &self.dest_handle);
            overlay(&mut config.destination.app_password, &self.dest_password);
            overlay(&mut config.destination.list.name, &self.list_name);
            overlay(&mut config.destination.list.description, &self.list_description);
            if let Some(purpose) = self.list_purpose {
                config.destination.list.purpose = Some(purpose.to_string());
            }

            if let Some(ms) = self.page_delay_ms {
                config.pacing.page_delay_ms = ms;
            }
            if let Some(ms) = self.success_delay_ms {
                config.pacing.success_delay_ms = ms;
            }
            if let Some(ms) = self.failure_delay_ms {
                config.pacing.failure_delay_ms = ms;
            }
            if let Some(seconds) = self.timeout_seconds {
                config.http.timeout_seconds = seconds;
            }

            Ok(config)
        }
    }

}
