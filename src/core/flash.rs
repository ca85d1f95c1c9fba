use std::path::{Path, PathBuf};

use crate::{
    core::{
        error::{BenchError, TaskKind},
        output::{OutputQueue, Severity},
        task_manager::Task,
    },
    protocol::programmer::{flash_file, ProgrammerFactory},
};

/// User input of the flash pane.
#[derive(Debug, Clone, Default)]
pub struct FlashArgs {
    pub image: Option<PathBuf>,
    pub port: Option<String>,
}

impl FlashArgs {
    /// Both an object file and a port are required.
    pub fn validate(self) -> Result<(PathBuf, String), BenchError> {
        match (self.image, self.port) {
            (Some(image), Some(port)) if !image.as_os_str().is_empty() && !port.is_empty() => {
                Ok((image, port))
            }
            _ => Err(BenchError::InvalidArguments(TaskKind::Flash)),
        }
    }
}

/// Programs one image and reports the outcome.
pub struct FlashTask {
    image: PathBuf,
    port: String,
    device: String,
    programmer: ProgrammerFactory,
}

impl FlashTask {
    pub fn prepare(
        args: FlashArgs,
        device: impl Into<String>,
        programmer: ProgrammerFactory,
    ) -> Result<Self, BenchError> {
        let (image, port) = args.validate()?;
        Ok(Self {
            image,
            port,
            device: device.into(),
            programmer,
        })
    }
}

fn display_name(image: &Path) -> String {
    image
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| image.display().to_string())
}

impl Task for FlashTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Flash
    }

    fn run(self, output: OutputQueue) {
        let name = display_name(&self.image);
        log::info!("flashing {} on {}", self.image.display(), self.port);

        let mut programmer = (self.programmer)();
        if flash_file(programmer.as_mut(), &self.device, &self.image, &self.port) {
            output.enqueue(format!("{name} flashed succesfully"), Severity::Success);
        } else {
            output.enqueue(BenchError::FlashFailed(name).to_string(), Severity::Error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::output::OutputSink,
        protocol::programmer::{tests::FakeProgrammer, Programmer},
    };
    use std::sync::Arc;

    fn factory(fake: FakeProgrammer) -> ProgrammerFactory {
        Arc::new(move || Box::new(fake.clone()) as Box<dyn Programmer>)
    }

    fn args(image: Option<&str>, port: Option<&str>) -> FlashArgs {
        FlashArgs {
            image: image.map(PathBuf::from),
            port: port.map(str::to_string),
        }
    }

    #[test]
    fn missing_inputs_are_rejected() {
        let fake = FakeProgrammer::default();
        for bad in [
            args(None, Some("COM3")),
            args(Some("fw.hex"), None),
            args(Some(""), Some("COM3")),
        ] {
            let err = FlashTask::prepare(bad, "attiny202", factory(fake.clone()))
                .err()
                .unwrap();
            assert_eq!(err.to_string(), "Invalid flash arguments");
        }
    }

    #[test]
    fn success_line_uses_the_file_name() {
        let fake = FakeProgrammer::default();
        let task = FlashTask::prepare(
            args(Some("/tmp/build/foo.hex"), Some("COM3")),
            "attiny202",
            factory(fake.clone()),
        )
        .unwrap();

        let mut sink = OutputSink::new();
        task.run(sink.queue());
        sink.drain();

        assert_eq!(sink.lines().len(), 1);
        assert_eq!(sink.lines()[0].text, "foo.hex flashed succesfully");
        assert_eq!(sink.lines()[0].severity, Severity::Success);
        assert_eq!(fake.steps.lock()[0], "connect COM3");
    }

    #[test]
    fn failure_line_is_an_error() {
        let fake = FakeProgrammer {
            fail_at: Some("verify"),
            ..Default::default()
        };
        let task =
            FlashTask::prepare(args(Some("foo.hex"), Some("COM3")), "attiny202", factory(fake))
                .unwrap();

        let mut sink = OutputSink::new();
        task.run(sink.queue());
        sink.drain();

        assert_eq!(sink.lines()[0].text, "foo.hex flash failed");
        assert_eq!(sink.lines()[0].severity, Severity::Error);
    }
}
