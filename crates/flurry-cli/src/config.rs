use anyhow::bail;
use clap::{Parser, Subcommand};
use core::time::Duration;
use flurry::{FLURRY_EPOCH, FlakeId, Options};
use std::time::{SystemTime, UNIX_EPOCH};

/// Runtime configuration for the `flurry` binary.
///
/// Every global setting can also come from the environment (or a `.env` file
/// in the working directory), which makes it easy to pin the instance ID per
/// host in a deployment.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flurry",
    version,
    about = "Generate and decode Snowflake-style 64-bit IDs"
)]
pub struct CliArgs {
    /// Epoch the timestamp field counts from, in milliseconds since
    /// 1970-01-01 UTC.
    ///
    /// All producers sharing an ID space must agree on this value. Defaults to
    /// 2019-01-01T00:00:00Z.
    ///
    /// Environment variable: `FLURRY_EPOCH_MS`
    #[arg(
        long,
        env = "FLURRY_EPOCH_MS",
        global = true,
        default_value_t = u64::try_from(FLURRY_EPOCH.as_millis()).unwrap_or(u64::MAX)
    )]
    pub epoch_ms: u64,

    /// Instance ID encoded into every generated ID (0-1023).
    ///
    /// Must be unique among all producers sharing the epoch; assigning it is
    /// up to the deployment.
    ///
    /// Environment variable: `FLURRY_INSTANCE_ID`
    #[arg(long, env = "FLURRY_INSTANCE_ID", global = true, default_value_t = 0)]
    pub instance_id: u64,

    /// Read time from a monotonic clock anchored at startup instead of the
    /// system wall clock.
    ///
    /// Environment variable: `FLURRY_MONOTONIC`
    #[arg(long, env = "FLURRY_MONOTONIC", global = true, default_value_t = false)]
    pub monotonic: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate IDs and print one per line.
    Generate {
        /// How many IDs to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u64,

        /// Print IDs as zero-padded 20-digit strings.
        #[arg(long, default_value_t = false)]
        padded: bool,
    },
    /// Split IDs into their timestamp, instance and sequence fields.
    Decode {
        /// Raw decimal IDs.
        #[arg(required = true)]
        ids: Vec<u64>,
    },
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub options: Options,
    pub monotonic: bool,
    pub command: Command,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.epoch_ms == 0 {
            bail!("FLURRY_EPOCH_MS must be greater than 0");
        }

        let max_instance_id = FlakeId::max_instance_id();
        if args.instance_id > max_instance_id {
            bail!(
                "FLURRY_INSTANCE_ID ({}) exceeds the instance ID space (max = {})",
                args.instance_id,
                max_instance_id
            );
        }

        let epoch = Duration::from_millis(args.epoch_ms);
        if matches!(args.command, Command::Generate { .. }) {
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?;
            if epoch > now {
                bail!(
                    "FLURRY_EPOCH_MS ({}) is in the future (now = {})",
                    args.epoch_ms,
                    now.as_millis()
                );
            }
        }

        if let Command::Generate { count: 0, .. } = args.command {
            bail!("--count must be greater than 0");
        }

        Ok(Self {
            options: Options::new(epoch, args.instance_id),
            monotonic: args.monotonic,
            command: args.command,
        })
    }
}
