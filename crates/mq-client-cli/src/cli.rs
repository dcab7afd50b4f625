use std::ffi::OsString;

use clap::builder::NonEmptyStringValueParser;
use clap::{ArgAction, Parser};
use log::trace;
use mqclient::{Credentials, Invocation, Outcome};

/// Short flags longer than one character, rewritten to their long form
/// before clap sees them.
const MULTI_CHAR_SHORTS: [(&str, &str); 3] = [
    ("-fn", "--function"),
    ("-pw", "--password"),
    ("-qm", "--queue-manager"),
];

/// Every flag takes a value; the token after one of these is never rewritten.
const VALUE_FLAGS: [&str; 15] = [
    "-c",
    "--channel",
    "--function",
    "-h",
    "--host-name",
    "--password",
    "-p",
    "--port",
    "-q",
    "--queue",
    "--queue-manager",
    "-t",
    "--type",
    "-u",
    "--userid",
];

#[derive(Debug, Parser)]
#[command(name = "mq-client")]
#[command(about = "list message ids on, or put a message to, an IBM MQ queue", long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// MQ channel name
    #[arg(short = 'c', long = "channel", value_parser = NonEmptyStringValueParser::new())]
    channel: String,

    /// list-message-ids | put-message
    #[arg(long = "function")]
    function: String,

    /// Broker host name
    #[arg(short = 'h', long = "host-name")]
    host_name: Option<String>,

    #[arg(long = "password", allow_hyphen_values = true)]
    password: String,

    /// Broker port
    #[arg(short = 'p', long = "port")]
    port: Option<String>,

    #[arg(short = 'q', long = "queue", value_parser = NonEmptyStringValueParser::new())]
    queue: String,

    #[arg(long = "queue-manager", value_parser = NonEmptyStringValueParser::new())]
    queue_manager: String,

    /// Transport type, currently only jms
    #[arg(short = 't', long = "type")]
    transport: String,

    #[arg(short = 'u', long = "userid")]
    userid: String,

    /// Print help
    #[arg(long = "help", action = ArgAction::Help)]
    help: Option<bool>,
}

impl Cli {
    /// Parses the process arguments, exiting with a usage error on failure.
    pub fn from_env() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    pub fn invocation(self) -> Invocation {
        Invocation {
            function: self.function,
            transport: self.transport,
            channel: self.channel,
            queue_manager: self.queue_manager,
            host: self.host_name,
            port: self.port,
            queue: self.queue,
            credentials: Credentials::new(self.userid, self.password),
        }
    }

    pub fn run(self) -> anyhow::Result<()> {
        trace!("run start [cli={:?}]", self.redacted());
        let outcome = self.invocation().run(mqclient::jms_connection_factory)?;

        match outcome {
            Outcome::Listed(ids) => trace!("list-message-ids end [count={}]", ids.len()),
            Outcome::Put(id) => trace!("put-message end [id={}]", id),
        }

        Ok(())
    }

    fn redacted(&self) -> String {
        format!(
            "channel={} function={} host={:?} port={:?} queue={} queue-manager={} type={} userid={}",
            self.channel,
            self.function,
            self.host_name,
            self.port,
            self.queue,
            self.queue_manager,
            self.transport,
            self.userid
        )
    }
}

/// Rewrites `-fn`, `-pw` and `-qm` (also in `-fn=value` form) to long flags.
///
/// Tokens in value position and everything after `--` pass through unchanged.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut expect_value = false;
    let mut passthrough = false;

    for (position, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if position == 0 || passthrough || expect_value {
            expect_value = false;
            out.push(arg);
            continue;
        }

        let Some(token) = arg.to_str() else {
            out.push(arg);
            continue;
        };

        if token == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }

        let (flag, inline_value) = match token.split_once('=') {
            Some((flag, value)) => (flag, Some(value)),
            None => (token, None),
        };

        let long = MULTI_CHAR_SHORTS
            .iter()
            .find(|(short, _)| *short == flag)
            .map(|(_, long)| *long);

        let flag = long.unwrap_or(flag);
        expect_value = inline_value.is_none() && VALUE_FLAGS.contains(&flag);

        match (long, inline_value) {
            (Some(long), Some(value)) => out.push(format!("{}={}", long, value).into()),
            (Some(long), None) => out.push(long.into()),
            (None, _) => out.push(arg),
        }
    }

    out
}
