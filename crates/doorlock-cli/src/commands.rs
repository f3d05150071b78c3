//! Operator input parsing.
//!
//! A line of input is either a run of keypad keys (`o123456o`) or a colon
//! command (`:fp no_match 4`). Whitespace between keys is ignored.

use anyhow::{Context, Result, anyhow, bail};

use doorlock_core::constants::DEFAULT_TEMPLATE_ID;
use doorlock_core::{FingerprintOutcome, FingerprintReading, KeypadInput};

/// Default number of log entries printed by `:logs`.
pub const DEFAULT_LOG_LINES: usize = 10;

pub const HELP: &str = "\
keys:      0-9 digits, o/k OK, c/x Cancel, f/s fingerprint (S16), # unused
:seed              pre-load test users 111111 and 222222
:reset             power-cycle the simulator
:fp OUTCOME [ID]   next capture: match, no_match, no_finger, error
:logs [N]          show the newest N log entries
:wait SECS         let the clock run, then redraw
:show              redraw the display
:json              print the snapshot as JSON
:help              this text
:quit              exit";

/// One parsed line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Keys(Vec<KeypadInput>),
    Seed,
    Reset,
    Fingerprint(FingerprintReading),
    Logs(usize),
    Wait(u64),
    Show,
    Json,
    Help,
    Quit,
}

/// Parse one line of input.
pub fn parse_line(line: &str) -> Result<Operator> {
    let line = line.trim();

    let Some(command) = line.strip_prefix(':') else {
        return parse_keys(line).map(Operator::Keys);
    };

    let mut words = command.split_whitespace();
    let name = words.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    match name.as_str() {
        "seed" => Ok(Operator::Seed),
        "reset" => Ok(Operator::Reset),
        "fp" | "finger" => parse_fingerprint(&args).map(Operator::Fingerprint),
        "logs" | "log" => match args.first() {
            Some(n) => n
                .parse()
                .map(Operator::Logs)
                .with_context(|| format!("invalid log count '{n}'")),
            None => Ok(Operator::Logs(DEFAULT_LOG_LINES)),
        },
        "wait" => {
            let secs = args.first().ok_or_else(|| anyhow!(":wait needs a number of seconds"))?;
            secs.parse()
                .map(Operator::Wait)
                .with_context(|| format!("invalid seconds '{secs}'"))
        }
        "show" => Ok(Operator::Show),
        "json" => Ok(Operator::Json),
        "help" | "h" | "?" => Ok(Operator::Help),
        "quit" | "q" | "exit" => Ok(Operator::Quit),
        other => bail!("unknown command ':{other}' (try :help)"),
    }
}

fn parse_keys(line: &str) -> Result<Vec<KeypadInput>> {
    line.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| KeypadInput::from_char(c).with_context(|| format!("in '{line}'")))
        .collect()
}

fn parse_fingerprint(args: &[&str]) -> Result<FingerprintReading> {
    let outcome: FingerprintOutcome = args
        .first()
        .ok_or_else(|| anyhow!(":fp needs an outcome (match, no_match, no_finger, error)"))?
        .parse()?;

    let template_id = match args.get(1) {
        Some(id) => id
            .parse::<u8>()
            .with_context(|| format!("template id must be 0-255, got '{id}'"))?,
        None => DEFAULT_TEMPLATE_ID,
    };

    Ok(FingerprintReading::new(outcome, template_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_keys() {
        let op = parse_line("o 12 c").unwrap();
        assert_eq!(
            op,
            Operator::Keys(vec![
                KeypadInput::Confirm,
                KeypadInput::digit(1).unwrap(),
                KeypadInput::digit(2).unwrap(),
                KeypadInput::Cancel,
            ])
        );
    }

    #[test]
    fn test_empty_line_is_no_keys() {
        assert_eq!(parse_line("   ").unwrap(), Operator::Keys(vec![]));
    }

    #[test]
    fn test_invalid_key() {
        let err = parse_line("12z").unwrap_err();
        assert!(format!("{err:#}").contains("in '12z'"));
    }

    #[rstest]
    #[case(":seed", Operator::Seed)]
    #[case(":reset", Operator::Reset)]
    #[case(":show", Operator::Show)]
    #[case(":json", Operator::Json)]
    #[case(":q", Operator::Quit)]
    #[case(":logs", Operator::Logs(DEFAULT_LOG_LINES))]
    #[case(":logs 3", Operator::Logs(3))]
    #[case(":wait 5", Operator::Wait(5))]
    fn test_commands(#[case] line: &str, #[case] expected: Operator) {
        assert_eq!(parse_line(line).unwrap(), expected);
    }

    #[test]
    fn test_fingerprint_command() {
        assert_eq!(
            parse_line(":fp no_match 9").unwrap(),
            Operator::Fingerprint(FingerprintReading::new(FingerprintOutcome::NoMatch, 9u8))
        );
        assert_eq!(
            parse_line(":fp match").unwrap(),
            Operator::Fingerprint(FingerprintReading::default())
        );
    }

    #[rstest]
    #[case(":fp")]
    #[case(":fp smudge")]
    #[case(":fp match 300")]
    #[case(":wait")]
    #[case(":wait soon")]
    #[case(":open")]
    fn test_invalid_commands(#[case] line: &str) {
        assert!(parse_line(line).is_err());
    }
}
