//! Output devices
//!
//! Two sink shapes, matching the two render paths:
//! - [`RawSink`]: accepts an ESC/POS byte stream (network thermal printer,
//!   Windows RAW spooler)
//! - [`PageSink`]: accepts a rendered page (file writer, driver printer)
//!
//! Every sink acquires the device per job and releases it on all exit paths;
//! nothing is held between dispatches.

use image::GrayImage;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument};

use crate::error::{PrintError, PrintResult};

/// Pick the first device whose name contains `contains`, case-insensitive.
///
/// An empty matcher selects the first enumerated device. No match is an
/// error surfaced to the caller, never a silent redirect to a default
/// device.
pub fn select_device<'a>(devices: &'a [String], contains: &str) -> PrintResult<&'a str> {
    let needle = contains.to_lowercase();
    devices
        .iter()
        .map(String::as_str)
        .find(|name| name.to_lowercase().contains(&needle))
        .ok_or_else(|| PrintError::NoMatchingDevice(contains.to_string()))
}

/// Sink for a raw ESC/POS byte stream
#[allow(async_fn_in_trait)]
pub trait RawSink {
    /// Send the full command stream to the device
    async fn write(&self, data: &[u8]) -> PrintResult<()>;
}

/// Sink for a rendered page
#[allow(async_fn_in_trait)]
pub trait PageSink {
    /// Commit the page to the device; dropping the page before this call
    /// cancels the job with no side effect
    async fn commit(&self, page: &GrayImage) -> PrintResult<()>;
}

/// Network thermal printer (TCP port 9100)
///
/// Most thermal printers accept raw printing on port 9100.
#[derive(Debug, Clone)]
pub struct NetworkSink {
    addr: SocketAddr,
}

impl NetworkSink {
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        let addr_str = format!("{host}:{port}");
        let addr = addr_str
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("invalid address: {addr_str}")))?;
        Ok(Self { addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl RawSink for NetworkSink {
    #[instrument(skip(data), fields(addr = %self.addr, data_len = data.len()))]
    async fn write(&self, data: &[u8]) -> PrintResult<()> {
        let mut stream = TcpStream::connect(self.addr)
            .await
            .map_err(|e| PrintError::DeviceWriteFailure(format!("{}: {e}", self.addr)))?;

        stream
            .write_all(data)
            .await
            .map_err(|e| PrintError::DeviceWriteFailure(format!("{}: {e}", self.addr)))?;
        stream
            .flush()
            .await
            .map_err(|e| PrintError::DeviceWriteFailure(format!("{}: {e}", self.addr)))?;

        info!("print job sent");
        Ok(())
    }
}

/// Virtual "print to file" page device: writes the page as a PNG.
#[derive(Debug, Clone)]
pub struct FilePageSink {
    path: PathBuf,
}

impl FilePageSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl PageSink for FilePageSink {
    #[instrument(skip(page), fields(path = %self.path.display()))]
    async fn commit(&self, page: &GrayImage) -> PrintResult<()> {
        let page = page.clone();
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            page.save_with_format(&path, image::ImageFormat::Png)
                .map_err(|e| PrintError::DeviceWriteFailure(format!("{}: {e}", path.display())))
        })
        .await
        .map_err(|e| PrintError::DeviceWriteFailure(format!("writer task failed: {e}")))??;

        info!("page written");
        Ok(())
    }
}

/// Windows spooler RAW device
///
/// Drives an installed printer through the spooler with the RAW datatype,
/// which passes the ESC/POS stream through unmodified.
#[cfg(windows)]
pub struct SpoolerSink {
    name: String,
}

#[cfg(windows)]
impl SpoolerSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn write_raw(&self, data: &[u8]) -> PrintResult<()> {
        use core::ffi::c_void;
        use windows::Win32::Graphics::Printing::{
            ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, OpenPrinterW,
            PRINTER_HANDLE, StartDocPrinterW, StartPagePrinter, WritePrinter,
        };
        use windows::core::{PCWSTR, PWSTR};

        fn to_wide(s: &str) -> Vec<u16> {
            s.encode_utf16().chain(std::iter::once(0)).collect()
        }

        unsafe {
            let mut handle: PRINTER_HANDLE = PRINTER_HANDLE::default();
            let name_w = to_wide(&self.name);

            OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None)
                .map_err(|_| PrintError::DeviceWriteFailure("OpenPrinterW failed".to_string()))?;

            let doc_name_w = to_wide("Ticket");
            let datatype_w = to_wide("RAW");
            let doc_info = DOC_INFO_1W {
                pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
                pOutputFile: PWSTR::null(),
                pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
            };

            if StartDocPrinterW(handle, 1, &doc_info as *const DOC_INFO_1W) == 0 {
                let _ = ClosePrinter(handle);
                return Err(PrintError::DeviceWriteFailure(
                    "StartDocPrinter failed".to_string(),
                ));
            }

            if !StartPagePrinter(handle).as_bool() {
                let _ = EndDocPrinter(handle);
                let _ = ClosePrinter(handle);
                return Err(PrintError::DeviceWriteFailure(
                    "StartPagePrinter failed".to_string(),
                ));
            }

            let mut written: u32 = 0;
            let ok = WritePrinter(
                handle,
                data.as_ptr() as *const c_void,
                data.len() as u32,
                &mut written,
            );

            let _ = EndPagePrinter(handle);
            let _ = EndDocPrinter(handle);
            let _ = ClosePrinter(handle);

            if !ok.as_bool() {
                return Err(PrintError::DeviceWriteFailure(
                    "WritePrinter failed".to_string(),
                ));
            }

            if written != data.len() as u32 {
                return Err(PrintError::DeviceWriteFailure(
                    "incomplete write".to_string(),
                ));
            }

            Ok(())
        }
    }
}

#[cfg(windows)]
impl RawSink for SpoolerSink {
    async fn write(&self, data: &[u8]) -> PrintResult<()> {
        // Spooler calls are synchronous, run in a blocking task
        let sink = SpoolerSink::new(self.name.clone());
        let data = data.to_vec();

        tokio::task::spawn_blocking(move || sink.write_raw(&data))
            .await
            .map_err(|e| PrintError::DeviceWriteFailure(format!("spooler task failed: {e}")))?
    }
}

/// Enumerate installed printer names, virtual devices included
/// (the raster path deliberately targets "Print to PDF" style devices).
#[cfg(windows)]
pub fn list_spooler_devices() -> PrintResult<Vec<String>> {
    use windows::Win32::Graphics::Printing::{
        EnumPrintersW, PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL, PRINTER_INFO_5W,
    };
    use windows::core::PWSTR;

    unsafe {
        let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
        let mut needed: u32 = 0;
        let mut returned: u32 = 0;

        let _ = EnumPrintersW(flags, None, 5, None, &mut needed, &mut returned);

        if needed == 0 {
            return Ok(Vec::new());
        }

        let mut buf: Vec<u8> = vec![0; needed as usize];
        EnumPrintersW(
            flags,
            None,
            5,
            Some(buf.as_mut_slice()),
            &mut needed,
            &mut returned,
        )
        .map_err(|_| PrintError::DeviceWriteFailure("EnumPrintersW failed".to_string()))?;

        let ptr = buf.as_ptr() as *const PRINTER_INFO_5W;
        let slice = std::slice::from_raw_parts(ptr, returned as usize);

        let mut result = Vec::new();
        for info in slice.iter() {
            if info.pPrinterName.is_null() {
                continue;
            }
            let name = PWSTR(info.pPrinterName.0).to_string().unwrap_or_default();
            if !name.is_empty() {
                result.push(name);
            }
        }

        Ok(result)
    }
}
