//! Print dispatch
//!
//! Selects the renderer for the configured mode and drives the sink with a
//! bounded wait. One dispatch produces one physical output; the job is
//! discarded afterwards and a reprint is a new explicit dispatch.

use std::future::Future;
use tracing::{info, instrument};

use crate::config::{PrintConfig, PrintMode};
use crate::device::{PageSink, RawSink, select_device};
use crate::error::{PrintError, PrintResult};
use crate::escpos::render_escpos;
use crate::raster::{render_page, scale_to_device};

/// Logical page width for the raster surface, scaled to the device later.
/// Wide enough that a PDF target does not come out miniature.
const PAGE_WIDTH_PX: u32 = 760;

/// One resolved ticket ready to print
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    /// Fully resolved ticket text (template already rendered)
    pub text: String,
    /// Authority verification URL to embed as a QR code
    pub qr_url: Option<String>,
}

impl PrintJob {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            qr_url: None,
        }
    }

    pub fn with_qr(mut self, url: impl Into<String>) -> Self {
        self.qr_url = Some(url.into());
        self
    }
}

/// Drives one of the two output backends according to configuration
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: PrintConfig,
}

impl Dispatcher {
    pub fn new(config: PrintConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PrintConfig {
        &self.config
    }

    /// Pick the target device from the enumerated names using the configured
    /// substring matcher
    pub fn select_device<'a>(&self, devices: &'a [String]) -> PrintResult<&'a str> {
        select_device(
            devices,
            self.config.printer_name_contains.as_deref().unwrap_or(""),
        )
    }

    /// Command-stream path: ESC/POS bytes to a raw sink.
    ///
    /// Once bytes are on the wire there is no cancellation; the thermal
    /// printer has already started cutting paper.
    #[instrument(skip(self, job, sink))]
    pub async fn dispatch_escpos(&self, job: &PrintJob, sink: &impl RawSink) -> PrintResult<()> {
        if self.config.mode != PrintMode::EscPos {
            return Err(PrintError::InvalidConfig(
                "dispatcher is configured for the raster path".to_string(),
            ));
        }

        let data = render_escpos(job, self.config.paper_width);
        info!(bytes = data.len(), "dispatching command stream");
        self.bounded(sink.write(&data)).await
    }

    /// Raster path: render the page, scale it to the device's printable
    /// width, then commit. Failures before `commit` leave the device
    /// untouched.
    #[instrument(skip(self, job, sink))]
    pub async fn dispatch_raster(
        &self,
        job: &PrintJob,
        sink: &impl PageSink,
        printable_width: u32,
    ) -> PrintResult<()> {
        if self.config.mode != PrintMode::Gdi {
            return Err(PrintError::InvalidConfig(
                "dispatcher is configured for the command-stream path".to_string(),
            ));
        }

        let page = render_page(job, PAGE_WIDTH_PX)?;
        let page = scale_to_device(&page, printable_width);
        info!(width = page.width(), height = page.height(), "dispatching page");
        self.bounded(sink.commit(&page)).await
    }

    /// Bound sink I/O with the configured timeout; a device that hangs
    /// surfaces as `PrintTimeout` instead of blocking the register.
    async fn bounded<F>(&self, fut: F) -> PrintResult<()>
    where
        F: Future<Output = PrintResult<()>>,
    {
        match tokio::time::timeout(self.config.timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(PrintError::PrintTimeout(format!(
                "device did not complete within {}s",
                self.config.timeout_secs
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct CapturingSink {
        data: Mutex<Vec<u8>>,
    }

    impl RawSink for CapturingSink {
        async fn write(&self, data: &[u8]) -> PrintResult<()> {
            self.data.lock().unwrap().extend_from_slice(data);
            Ok(())
        }
    }

    struct SlowSink;

    impl RawSink for SlowSink {
        async fn write(&self, _data: &[u8]) -> PrintResult<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[derive(Default)]
    struct CapturingPageSink {
        size: Mutex<Option<(u32, u32)>>,
    }

    impl PageSink for CapturingPageSink {
        async fn commit(&self, page: &GrayImage) -> PrintResult<()> {
            *self.size.lock().unwrap() = Some((page.width(), page.height()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn escpos_dispatch_sends_the_rendered_stream() {
        let dispatcher = Dispatcher::new(PrintConfig::new(PrintMode::EscPos));
        let sink = CapturingSink::default();
        let job = PrintJob::new("Total: 150.00").with_qr("https://www.afip.gob.ar/fe/qr/?p=abc");

        dispatcher.dispatch_escpos(&job, &sink).await.unwrap();

        let data = sink.data.lock().unwrap();
        assert!(!data.is_empty());
        assert_eq!(&data[data.len() - 4..], &[0x1D, 0x56, 0x41, 0x10]);
    }

    #[tokio::test]
    async fn raster_dispatch_scales_to_the_device() {
        let dispatcher = Dispatcher::new(PrintConfig::new(PrintMode::Gdi));
        let sink = CapturingPageSink::default();
        let job = PrintJob::new("Total: 150.00");

        dispatcher.dispatch_raster(&job, &sink, 400).await.unwrap();

        let (w, _h) = sink.size.lock().unwrap().unwrap();
        assert_eq!(w, 400 - 2 * (400 / 20));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_device_surfaces_as_timeout() {
        let config = PrintConfig::new(PrintMode::EscPos).with_timeout(1);
        let dispatcher = Dispatcher::new(config);
        let job = PrintJob::new("x");

        let err = dispatcher.dispatch_escpos(&job, &SlowSink).await.unwrap_err();
        assert!(matches!(err, PrintError::PrintTimeout(_)));
    }

    #[tokio::test]
    async fn mode_mismatch_is_rejected() {
        let dispatcher = Dispatcher::new(PrintConfig::new(PrintMode::Gdi));
        let err = dispatcher
            .dispatch_escpos(&PrintJob::new("x"), &CapturingSink::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PrintError::InvalidConfig(_)));
    }

    #[test]
    fn dispatcher_uses_the_configured_matcher() {
        let config = PrintConfig::new(PrintMode::Gdi).with_printer_match("PDF");
        let dispatcher = Dispatcher::new(config);

        let devices = vec!["EPSON TM-T20".to_string(), "Microsoft Print to PDF".to_string()];
        assert_eq!(
            dispatcher.select_device(&devices).unwrap(),
            "Microsoft Print to PDF"
        );

        let none = vec!["EPSON TM-T20".to_string()];
        assert!(matches!(
            dispatcher.select_device(&none),
            Err(PrintError::NoMatchingDevice(_))
        ));
    }
}
