//! Option Registry: the table of recognized flags and the parse over raw arguments.
//!
//! Flags keep their historical single-dash spelling (`-script`, `-restart`,
//! `-l0`). The registry checks every flag-position token against its table,
//! rewrites it into clap's `--name` / `-x` spelling and lets a `clap` command
//! built from the same table do the typed value parsing.
//!
//! # Parse contract
//! - `--help` anywhere in flag position wins, even over bad tokens.
//! - A token naming no registered flag → [`ConfigurationError::UnrecognizedFlag`].
//! - A value flag at the end of the line → [`ConfigurationError::MissingValue`].
//! - A value of the wrong type → [`ConfigurationError::MalformedValue`].
//! - Repeating a single-value flag keeps the last value; `-i` accumulates.

use crate::config::Configuration;
use crate::error::ConfigurationError;
use crate::overlay::{DiffTestOverlay, PhaseFieldOverlay};
use crate::types::{Dimension, Flavor};
use clap::error::{ContextKind, ContextValue};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

pub const HELP_FLAG: &str = "--help";

// ---------------------------------------------------------------------------
// Flag table
// ---------------------------------------------------------------------------

/// Storage type of a registered flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagKind {
    /// Presence sets `true`; takes no value.
    Switch,
    /// Signed integer.
    Int,
    /// Non-negative integer (frame numbers).
    Count,
    /// Positive integer (worker counts).
    Threads,
    Float,
    Text,
    /// Repeatable text, kept in order.
    TextList,
}

impl FlagKind {
    fn takes_value(self) -> bool {
        !matches!(self, FlagKind::Switch)
    }

    fn placeholder(self) -> &'static str {
        match self {
            FlagKind::Switch => "",
            FlagKind::Int | FlagKind::Count | FlagKind::Threads => " <int>",
            FlagKind::Float => " <float>",
            FlagKind::Text => " <path>",
            FlagKind::TextList => " <text>",
        }
    }
}

/// One recognized knob.
#[derive(Clone, Copy, Debug)]
pub struct FlagSpec {
    /// Exact command-line spelling, dashes included.
    pub name: &'static str,
    pub help: &'static str,
    pub kind: FlagKind,
}

impl FlagSpec {
    const fn new(name: &'static str, help: &'static str, kind: FlagKind) -> Self {
        Self { name, help, kind }
    }

    /// Name without leading dashes; doubles as the clap argument id.
    pub fn id(&self) -> &'static str {
        self.name.trim_start_matches('-')
    }

    fn short(&self) -> Option<char> {
        let mut chars = self.id().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }

    /// The spelling clap understands for this flag.
    fn clap_spelling(&self) -> String {
        match self.short() {
            Some(c) => format!("-{c}"),
            None => format!("--{}", self.id()),
        }
    }

    fn to_arg(&self) -> Arg {
        let arg = Arg::new(self.id()).help(self.help);
        let arg = match self.short() {
            Some(c) => arg.short(c),
            None => arg.long(self.id()),
        };
        let arg = arg.allow_hyphen_values(self.kind.takes_value());
        match self.kind {
            FlagKind::Switch => arg.action(ArgAction::SetTrue),
            FlagKind::Int => arg.action(ArgAction::Set).value_parser(value_parser!(i32)),
            FlagKind::Count => arg.action(ArgAction::Set).value_parser(value_parser!(u32)),
            FlagKind::Threads => arg
                .action(ArgAction::Set)
                .value_parser(value_parser!(u32).range(1..)),
            FlagKind::Float => arg.action(ArgAction::Set).value_parser(value_parser!(f64)),
            FlagKind::Text => arg
                .action(ArgAction::Set)
                .value_parser(value_parser!(String)),
            FlagKind::TextList => arg
                .action(ArgAction::Append)
                .value_parser(value_parser!(String)),
        }
    }
}

const COMMON_FLAGS: &[FlagSpec] = &[
    FlagSpec::new(HELP_FLAG, "Print help (this message) and exit", FlagKind::Switch),
    FlagSpec::new("-script", "Lua script to read for initial data", FlagKind::Text),
    FlagSpec::new("-i", "Append string to script", FlagKind::TextList),
    FlagSpec::new("-test", "Test number (non-lua test)", FlagKind::Int),
    FlagSpec::new("--3d", "Dimension is 3 (non-lua test)", FlagKind::Switch),
    FlagSpec::new("--run_diff_test", "Run diff test (non-lua test)", FlagKind::Switch),
    FlagSpec::new(
        "-dtps",
        "diff_test_perturbation_scale (non-lua test)",
        FlagKind::Float,
    ),
    FlagSpec::new("-restart", "Restart frame (non-lua test)", FlagKind::Count),
    FlagSpec::new("-p", "phase_field_percentage", FlagKind::Float),
    FlagSpec::new("-l0", "phase_field_l0_ratio", FlagKind::Float),
    FlagSpec::new("-t", "Set number of threads", FlagKind::Threads),
];

const FRACTURE_FLAGS: &[FlagSpec] = &[
    FlagSpec::new("-ax", "fiber direction a, x", FlagKind::Float),
    FlagSpec::new("-ay", "fiber direction a, y", FlagKind::Float),
    FlagSpec::new("-az", "fiber direction a, z", FlagKind::Float),
    FlagSpec::new("-bx", "fiber direction b, x", FlagKind::Float),
    FlagSpec::new("-by", "fiber direction b, y", FlagKind::Float),
    FlagSpec::new("-bz", "fiber direction b, z", FlagKind::Float),
    FlagSpec::new("-alpha1", "alpha1", FlagKind::Float),
    FlagSpec::new("-alpha2", "alpha2", FlagKind::Float),
    FlagSpec::new("-fiberScale", "fiberScale", FlagKind::Float),
    FlagSpec::new("-residual", "residual", FlagKind::Float),
    FlagSpec::new("-percent", "percent", FlagKind::Float),
    FlagSpec::new("-eta", "eta", FlagKind::Float),
    FlagSpec::new("-E", "Young's modulus", FlagKind::Float),
    FlagSpec::new("-rho", "rho", FlagKind::Float),
    FlagSpec::new("-tau", "tau", FlagKind::Float),
    FlagSpec::new("--useRadial", "useRadial", FlagKind::Switch),
    FlagSpec::new("--useLongitudinal", "useLongitudinal", FlagKind::Switch),
    FlagSpec::new("--isotropic", "useIsotropic", FlagKind::Switch),
    FlagSpec::new("--orthotropic", "useOrthotropic", FlagKind::Switch),
    FlagSpec::new("--inextensible", "useInextensible", FlagKind::Switch),
    FlagSpec::new("--implicit_damage", "implicit damage model", FlagKind::Switch),
    FlagSpec::new("-helper", "helper", FlagKind::Int),
    // Accepted so older command lines still parse; the crate is f64 throughout.
    FlagSpec::new("--double", "Double precision (always on)", FlagKind::Switch),
];

const COUPLING_FLAGS: &[FlagSpec] = &[FlagSpec::new(
    "-disablerestart",
    "Disable restart data",
    FlagKind::Switch,
)];

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Outcome of a successful parse.
#[derive(Clone, Debug, PartialEq)]
pub enum Parsed {
    /// `--help` was given; carries the usage text.
    Help(String),
    Run(Configuration),
}

/// The recognized flags of one executable.
#[derive(Clone, Debug)]
pub struct OptionRegistry {
    flavor: Flavor,
    flags: Vec<FlagSpec>,
}

impl OptionRegistry {
    pub fn for_flavor(flavor: Flavor) -> Self {
        let extra = match flavor {
            Flavor::Fracture => FRACTURE_FLAGS,
            Flavor::Coupling => COUPLING_FLAGS,
        };
        Self {
            flavor,
            flags: COMMON_FLAGS.iter().chain(extra).copied().collect(),
        }
    }

    pub fn flags(&self) -> &[FlagSpec] {
        &self.flags
    }

    pub fn lookup(&self, token: &str) -> Option<&FlagSpec> {
        self.flags.iter().find(|spec| spec.name == token)
    }

    /// Parse the argument vector (program name excluded).
    pub fn parse<I, S>(&self, args: I) -> Result<Parsed, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if self.wants_help(&args) {
            return Ok(Parsed::Help(self.usage()));
        }
        let normalized = self.normalize(&args)?;
        let matches = self
            .command()
            .try_get_matches_from(normalized)
            .map_err(|err| self.configuration_error(&err))?;
        Ok(Parsed::Run(self.configuration(&matches)))
    }

    /// Usage text, one line per flag in registration order.
    pub fn usage(&self) -> String {
        let width = self
            .flags
            .iter()
            .map(|spec| spec.name.len() + spec.kind.placeholder().len())
            .max()
            .unwrap_or(0);
        let mut out = String::new();
        for spec in &self.flags {
            let lhs = format!("{}{}", spec.name, spec.kind.placeholder());
            out.push_str(&format!("  {lhs:<width$}   {}\n", spec.help));
        }
        out
    }

    /// True when `--help` appears in flag position. Values are skipped so
    /// `-i --help` does not count.
    fn wants_help(&self, args: &[String]) -> bool {
        let mut iter = args.iter();
        while let Some(token) = iter.next() {
            if token == HELP_FLAG {
                return true;
            }
            if self.lookup(token).is_some_and(|spec| spec.kind.takes_value()) {
                iter.next();
            }
        }
        false
    }

    /// Rewrite flag tokens into clap spelling. Values pass through verbatim;
    /// every value argument accepts a leading `-`.
    fn normalize(&self, args: &[String]) -> Result<Vec<String>, ConfigurationError> {
        let mut out = Vec::with_capacity(args.len());
        let mut iter = args.iter();
        while let Some(token) = iter.next() {
            let spec = self
                .lookup(token)
                .ok_or_else(|| ConfigurationError::UnrecognizedFlag(token.clone()))?;
            if spec.kind.takes_value() {
                let value = iter
                    .next()
                    .ok_or_else(|| ConfigurationError::MissingValue(spec.name.to_string()))?;
                out.push(spec.clap_spelling());
                out.push(value.clone());
            } else {
                out.push(spec.clap_spelling());
            }
        }
        Ok(out)
    }

    fn command(&self) -> Command {
        self.flags.iter().fold(
            Command::new(self.flavor.program_name())
                .no_binary_name(true)
                .disable_help_flag(true)
                .disable_version_flag(true)
                .args_override_self(true),
            |cmd, spec| cmd.arg(spec.to_arg()),
        )
    }

    fn configuration_error(&self, err: &clap::Error) -> ConfigurationError {
        let arg = context_string(err, ContextKind::InvalidArg);
        let value = context_string(err, ContextKind::InvalidValue);
        let flag = arg.as_deref().map(|arg| self.display_name(arg));
        match (flag, value) {
            (Some(flag), Some(value)) => ConfigurationError::MalformedValue { flag, value },
            (Some(flag), None) => ConfigurationError::UnrecognizedFlag(flag),
            (None, _) => ConfigurationError::UnrecognizedFlag(err.kind().to_string()),
        }
    }

    /// Map clap's rendering (`--test <test>`) back to the registered spelling.
    fn display_name(&self, clap_arg: &str) -> String {
        let id = clap_arg
            .split_whitespace()
            .next()
            .unwrap_or(clap_arg)
            .trim_start_matches('-');
        self.flags
            .iter()
            .find(|spec| spec.id() == id)
            .map(|spec| spec.name.to_string())
            .unwrap_or_else(|| clap_arg.to_string())
    }

    fn configuration(&self, m: &ArgMatches) -> Configuration {
        let mut config = Configuration::new(self.flavor);

        config.script_path = value::<String>(m, "script")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        config.inline_fragments = m
            .try_get_many::<String>("i")
            .ok()
            .flatten()
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        config.test_number = value::<i32>(m, "test");
        config.dimension = Dimension::from_three_d(switch(m, "3d"));
        config.restart_frame = value::<u32>(m, "restart").unwrap_or(0);
        config.diff_test = DiffTestOverlay::from_flags(
            switch(m, "run_diff_test"),
            value::<f64>(m, "dtps").unwrap_or(DiffTestOverlay::DEFAULT_SCALE),
        );
        config.threads = value::<u32>(m, "t").map(|n| n as usize);
        config.phase_field = PhaseFieldOverlay {
            percentage: value::<f64>(m, "p"),
            l0_ratio: value::<f64>(m, "l0"),
        };
        config.disable_restart = switch(m, "disablerestart");

        let fracture = &mut config.fracture;
        let float = |id: &str, slot: &mut f64| {
            if let Some(v) = value::<f64>(m, id) {
                *slot = v;
            }
        };
        float("ax", &mut fracture.a[0]);
        float("ay", &mut fracture.a[1]);
        float("az", &mut fracture.a[2]);
        float("bx", &mut fracture.b[0]);
        float("by", &mut fracture.b[1]);
        float("bz", &mut fracture.b[2]);
        float("alpha1", &mut fracture.alpha1);
        float("alpha2", &mut fracture.alpha2);
        float("fiberScale", &mut fracture.fiber_scale);
        float("residual", &mut fracture.residual);
        float("percent", &mut fracture.percent);
        float("eta", &mut fracture.eta);
        float("E", &mut fracture.youngs_modulus);
        float("rho", &mut fracture.rho);
        float("tau", &mut fracture.tau);
        fracture.use_radial = switch(m, "useRadial");
        fracture.use_longitudinal = switch(m, "useLongitudinal");
        fracture.isotropic = switch(m, "isotropic");
        fracture.orthotropic = switch(m, "orthotropic");
        fracture.inextensible = switch(m, "inextensible");
        fracture.implicit_damage = switch(m, "implicit_damage");
        if let Some(helper) = value::<i32>(m, "helper") {
            fracture.helper = helper;
        }

        config
    }
}

/// Flags the other flavor registers are simply absent here.
fn value<T: Clone + Send + Sync + 'static>(m: &ArgMatches, id: &str) -> Option<T> {
    m.try_get_one::<T>(id).ok().flatten().cloned()
}

fn switch(m: &ArgMatches, id: &str) -> bool {
    value::<bool>(m, id).unwrap_or(false)
}

fn context_string(err: &clap::Error, kind: ContextKind) -> Option<String> {
    match err.get(kind) {
        Some(ContextValue::String(s)) => Some(s.clone()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(flavor: Flavor, args: &[&str]) -> Result<Parsed, ConfigurationError> {
        OptionRegistry::for_flavor(flavor).parse(args.iter().copied())
    }

    fn run_config(flavor: Flavor, args: &[&str]) -> Configuration {
        match parse(flavor, args) {
            Ok(Parsed::Run(config)) => config,
            other => panic!("expected a run configuration, got {other:?}"),
        }
    }

    #[test]
    fn empty_command_line_keeps_defaults() {
        let config = run_config(Flavor::Fracture, &[]);
        assert_eq!(config, Configuration::new(Flavor::Fracture));
        assert_eq!(config.restart_frame, 0);
        assert!(config.diff_test.is_none());
        assert!(config.threads.is_none());
    }

    #[test]
    fn core_flags_fill_their_slots() {
        let config = run_config(
            Flavor::Fracture,
            &[
                "-script", "foo.lua", "-test", "5", "--3d", "-restart", "12", "-t", "4", "-p",
                "0.2", "-l0", "0.5",
            ],
        );
        assert_eq!(config.script_path, Some(PathBuf::from("foo.lua")));
        assert_eq!(config.test_number, Some(5));
        assert_eq!(config.dimension, Dimension::ThreeD);
        assert_eq!(config.restart_frame, 12);
        assert_eq!(config.threads, Some(4));
        assert_eq!(config.phase_field.percentage, Some(0.2));
        assert_eq!(config.phase_field.l0_ratio, Some(0.5));
    }

    #[test]
    fn inline_fragments_keep_order_and_hyphen_values() {
        let config = run_config(
            Flavor::Coupling,
            &["-i", "a = 1", "-test", "2", "-i", "-- note", "-i", "b = 2"],
        );
        assert_eq!(config.inline_fragments, vec!["a = 1", "-- note", "b = 2"]);
    }

    #[test]
    fn diff_test_needs_enable_flag() {
        let off = run_config(Flavor::Fracture, &["-dtps", "0.5"]);
        assert!(off.diff_test.is_none(), "scale alone does not enable");

        let on = run_config(Flavor::Fracture, &["--run_diff_test"]);
        assert_eq!(
            on.diff_test.map(|d| d.perturbation_scale),
            Some(DiffTestOverlay::DEFAULT_SCALE)
        );

        let scaled = run_config(Flavor::Fracture, &["--run_diff_test", "-dtps", "0.5"]);
        assert_eq!(scaled.diff_test.map(|d| d.perturbation_scale), Some(0.5));
    }

    #[test]
    fn empty_script_path_means_no_script() {
        let config = run_config(Flavor::Fracture, &["-script", ""]);
        assert_eq!(config.script_path, None);
    }

    #[test]
    fn fracture_material_flags() {
        let config = run_config(
            Flavor::Fracture,
            &[
                "-ax", "-0.5", "-ay", "1", "-E", "500", "--implicit_damage", "--orthotropic",
                "-helper", "3",
            ],
        );
        assert_eq!(config.fracture.a, [-0.5, 1.0, 0.0]);
        assert_eq!(config.fracture.youngs_modulus, 500.0);
        assert!(config.fracture.implicit_damage);
        assert!(config.fracture.orthotropic);
        assert_eq!(config.fracture.helper, 3);
        assert_eq!(config.fracture.residual, 0.001, "untouched default");
    }

    #[test]
    fn double_precision_switch_is_accepted_and_ignored() {
        let config = run_config(Flavor::Fracture, &["--double", "-test", "1"]);
        let mut expected = Configuration::new(Flavor::Fracture);
        expected.test_number = Some(1);
        assert_eq!(config, expected);

        assert_eq!(
            parse(Flavor::Coupling, &["--double"]),
            Err(ConfigurationError::UnrecognizedFlag("--double".into()))
        );
    }

    #[test]
    fn flavor_specific_flags_are_not_shared() {
        let config = run_config(Flavor::Coupling, &["-disablerestart"]);
        assert!(config.disable_restart);

        assert_eq!(
            parse(Flavor::Fracture, &["-disablerestart"]),
            Err(ConfigurationError::UnrecognizedFlag("-disablerestart".into()))
        );
        assert_eq!(
            parse(Flavor::Coupling, &["--implicit_damage"]),
            Err(ConfigurationError::UnrecognizedFlag("--implicit_damage".into()))
        );
    }

    #[test]
    fn unknown_flag_reports_token() {
        assert_eq!(
            parse(Flavor::Fracture, &["-test", "1", "-bogus"]),
            Err(ConfigurationError::UnrecognizedFlag("-bogus".into()))
        );
        assert_eq!(
            parse(Flavor::Fracture, &["stray"]),
            Err(ConfigurationError::UnrecognizedFlag("stray".into()))
        );
    }

    #[test]
    fn malformed_values_report_flag_and_value() {
        assert_eq!(
            parse(Flavor::Fracture, &["-test", "five"]),
            Err(ConfigurationError::MalformedValue {
                flag: "-test".into(),
                value: "five".into()
            })
        );
        assert_eq!(
            parse(Flavor::Coupling, &["-restart", "-3"]),
            Err(ConfigurationError::MalformedValue {
                flag: "-restart".into(),
                value: "-3".into()
            })
        );
        assert!(matches!(
            parse(Flavor::Coupling, &["-t", "0"]),
            Err(ConfigurationError::MalformedValue { ref flag, .. }) if flag == "-t"
        ));
    }

    #[test]
    fn trailing_value_flag_is_missing_value() {
        assert_eq!(
            parse(Flavor::Fracture, &["-test", "1", "-script"]),
            Err(ConfigurationError::MissingValue("-script".into()))
        );
    }

    #[test]
    fn repeated_flag_keeps_last_value() {
        let config = run_config(Flavor::Fracture, &["-test", "1", "-test", "7"]);
        assert_eq!(config.test_number, Some(7));
    }

    #[test]
    fn help_short_circuits_everything() {
        let registry = OptionRegistry::for_flavor(Flavor::Fracture);
        let parsed = registry
            .parse(["-script", "missing.lua", "-bogus", "--help", "-test", "x"])
            .unwrap();
        assert_eq!(parsed, Parsed::Help(registry.usage()));
    }

    #[test]
    fn help_as_inline_value_is_not_help() {
        let config = run_config(Flavor::Fracture, &["-i", "--help"]);
        assert_eq!(config.inline_fragments, vec!["--help"]);
    }

    #[test]
    fn usage_lists_every_flag() {
        let registry = OptionRegistry::for_flavor(Flavor::Coupling);
        let usage = registry.usage();
        for spec in registry.flags() {
            assert!(usage.contains(spec.name), "usage missing {}", spec.name);
        }
        assert!(usage.contains("-script <path>"));
        assert!(!usage.contains("-fiberScale"));
    }
}
