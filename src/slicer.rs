use crate::error::{Result, TraceError};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::str::FromStr;

/// A single `-s key=value` override passed to the slicer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl Setting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

impl FromStr for Setting {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self> {
        // Split on the first '=' only; values may contain '=' themselves.
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok(Setting::new(key.trim(), value))
            }
            _ => Err(TraceError::InvalidSetting(s.to_string())),
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Which output stream(s) of the slicer hold the debug text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Capture {
    #[default]
    Stdout,
    Stderr,
    /// Stdout followed by stderr. Relative interleaving is not preserved.
    Both,
}

/// What came back from one slicer run.
#[derive(Clone, Debug)]
pub struct SlicerOutput {
    pub text: String,
    pub exit_code: Option<i32>,
    pub success: bool,
}

/// Command line for one slicer invocation.
#[derive(Clone, Debug)]
pub struct SlicerCommand {
    pub program: PathBuf,
    pub subcommand: Option<String>,
    pub verbose: bool,
    pub definitions: Vec<PathBuf>,
    pub settings: Vec<Setting>,
    pub models: Vec<PathBuf>,
    pub extra_args: Vec<OsString>,
    pub capture: Capture,
}

impl SlicerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            subcommand: Some("slice".to_string()),
            verbose: true,
            definitions: Vec::new(),
            settings: Vec::new(),
            models: Vec::new(),
            extra_args: Vec::new(),
            capture: Capture::default(),
        }
    }

    pub fn with_definition(mut self, path: impl Into<PathBuf>) -> Self {
        self.definitions.push(path.into());
        self
    }

    pub fn with_setting(mut self, setting: Setting) -> Self {
        self.settings.push(setting);
        self
    }

    pub fn with_model(mut self, path: impl Into<PathBuf>) -> Self {
        self.models.push(path.into());
        self
    }

    pub fn with_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn with_capture(mut self, capture: Capture) -> Self {
        self.capture = capture;
        self
    }

    /// The argument vector, without the program itself.
    ///
    /// Models go last: the slicer applies `-s` overrides to the models that
    /// follow them on the command line.
    pub fn args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        if let Some(sub) = &self.subcommand {
            args.push(OsString::from(sub));
        }
        if self.verbose {
            args.push(OsString::from("-v"));
        }
        for def in &self.definitions {
            args.push(OsString::from("-j"));
            args.push(def.clone().into_os_string());
        }
        for setting in &self.settings {
            args.push(OsString::from("-s"));
            args.push(OsString::from(setting.to_string()));
        }
        args.extend(self.extra_args.iter().cloned());
        for model in &self.models {
            args.push(OsString::from("-l"));
            args.push(model.clone().into_os_string());
        }
        args
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args());
        cmd
    }

    /// Runs the slicer to completion and returns its captured output.
    ///
    /// Only a failure to start the process is an error. A non-zero exit is
    /// logged and the captured output is returned anyway.
    pub fn run(&self) -> Result<SlicerOutput> {
        let program = self.program.display().to_string();
        log::info!("Running {} {:?}", program, self.args());

        let output = self
            .to_command()
            .output()
            .map_err(|source| TraceError::Spawn { program: program.clone(), source })?;

        let bytes = match self.capture {
            Capture::Stdout => output.stdout,
            Capture::Stderr => output.stderr,
            Capture::Both => {
                let mut b = output.stdout;
                b.extend_from_slice(&output.stderr);
                b
            }
        };

        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Slicer output is not valid UTF-8; decoding lossily");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        let success = output.status.success();
        let exit_code = output.status.code();
        if !success {
            match exit_code {
                Some(code) => log::warn!("{} exited with status {}; using captured output", program, code),
                None => log::warn!("{} was terminated by a signal; using captured output", program),
            }
        }
        log::debug!("Captured {} bytes of slicer output", text.len());

        Ok(SlicerOutput { text, exit_code, success })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_parse() {
        let s: Setting = "extruder_nr=1".parse().unwrap();
        assert_eq!(s, Setting::new("extruder_nr", "1"));

        let s: Setting = "machine_start_gcode=G28 ; a=b".parse().unwrap();
        assert_eq!(s.key, "machine_start_gcode");
        assert_eq!(s.value, "G28 ; a=b");

        let s: Setting = "infill_sparse_density=".parse().unwrap();
        assert_eq!(s.value, "");

        assert!(matches!("no_equals".parse::<Setting>(), Err(TraceError::InvalidSetting(_))));
        assert!(matches!("=5".parse::<Setting>(), Err(TraceError::InvalidSetting(_))));
    }

    #[test]
    fn test_args_order() {
        let cmd = SlicerCommand::new("CuraEngine")
            .with_definition("fdmprinter.def.json")
            .with_setting(Setting::new("extruder_nr", "1"))
            .with_model("20mm_cube.stl")
            .with_setting(Setting::new("layer_height", "0.2"));

        let args: Vec<String> = cmd
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            vec![
                "slice", "-v",
                "-j", "fdmprinter.def.json",
                "-s", "extruder_nr=1",
                "-s", "layer_height=0.2",
                "-l", "20mm_cube.stl",
            ]
        );
    }

    #[test]
    fn test_args_without_subcommand_or_verbose() {
        let mut cmd = SlicerCommand::new("slicer").with_arg("--debug");
        cmd.subcommand = None;
        cmd.verbose = false;
        assert_eq!(cmd.args(), vec![OsString::from("--debug")]);
    }
}
