// src/source.rs
//! Where batches of NMEA text come from

use crate::{
    config::GpsConfig,
    error::{GpsError, Result},
    simulation,
};
use log::{debug, info, warn};
use std::{collections::VecDeque, path::PathBuf, time::Duration};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
    time::{timeout_at, Instant},
};
use tokio_serial::SerialPortBuilderExt;

/// GPS data source configuration
#[derive(Debug, Clone, PartialEq)]
pub enum GpsSource {
    /// Built-in recorded paragraphs
    Simulated,
    /// Text file, paragraphs separated by blank lines
    Replay { path: PathBuf },
    Serial { port: String, baudrate: u32 },
    /// gpsd daemon relaying raw NMEA
    Tcp { host: String, port: u16 },
}

impl GpsSource {
    pub fn from_config(config: &GpsConfig) -> Result<Self> {
        match config.source_type.as_str() {
            "simulated" => Ok(GpsSource::Simulated),
            "replay" => {
                let path = config
                    .replay_file
                    .clone()
                    .ok_or_else(|| GpsError::Config("replay source needs a file".to_string()))?;
                Ok(GpsSource::Replay { path })
            }
            "serial" => {
                let port = config
                    .serial_port
                    .clone()
                    .ok_or_else(|| GpsError::Config("serial source needs a port".to_string()))?;
                Ok(GpsSource::Serial {
                    port,
                    baudrate: config.serial_baudrate.unwrap_or(9600),
                })
            }
            "tcp" => Ok(GpsSource::Tcp {
                host: config.tcp_host.clone().unwrap_or_else(|| "localhost".to_string()),
                port: config.tcp_port.unwrap_or(2947),
            }),
            other => Err(GpsError::Config(format!("unknown source type '{}'", other))),
        }
    }

    /// Live sources pace themselves; recorded ones need a delay between batches.
    pub fn is_live(&self) -> bool {
        matches!(self, GpsSource::Serial { .. } | GpsSource::Tcp { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            GpsSource::Simulated => "simulated data".to_string(),
            GpsSource::Replay { path } => format!("replay of {}", path.display()),
            GpsSource::Serial { port, baudrate } => format!("serial {} at {} baud", port, baudrate),
            GpsSource::Tcp { host, port } => format!("gpsd at {}:{}", host, port),
        }
    }
}

type LineReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Yields one batch ("paragraph") of NMEA text at a time.
pub struct BatchSource {
    inner: Inner,
}

enum Inner {
    Paragraphs(VecDeque<String>),
    Stream {
        reader: LineReader,
        window: Duration,
        // Carries a line cut off by the window deadline
        pending: Vec<u8>,
        // Read error held back until the lines before it were handed out
        failed: Option<std::io::Error>,
    },
}

impl BatchSource {
    /// Open `source`; stream sources group the lines that arrive within `window`.
    pub async fn open(source: &GpsSource, window: Duration) -> Result<Self> {
        match source {
            GpsSource::Simulated => Ok(Self::from_paragraphs(simulation::PARAGRAPHS)),
            GpsSource::Replay { path } => {
                let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
                    GpsError::Connection(format!("Failed to read replay file {}: {}", path.display(), e))
                })?;
                Ok(Self::from_paragraphs(split_paragraphs(&contents)))
            }
            GpsSource::Serial { port, baudrate } => {
                info!("Connecting to GPS on {} at {} baud...", port, baudrate);
                let serial = tokio_serial::new(port, *baudrate)
                    .timeout(Duration::from_millis(1000))
                    .open_native_async()
                    .map_err(|e| GpsError::Connection(format!("Failed to open serial port {}: {}", port, e)))?;
                info!("Connected successfully!");
                Ok(Self::from_reader(BufReader::new(serial), window))
            }
            GpsSource::Tcp { host, port } => {
                info!("Connecting to gpsd at {}:{}...", host, port);
                let reader = connect_gpsd(host, *port).await?;
                info!("Connected successfully!");
                Ok(Self::from_reader(reader, window))
            }
        }
    }

    pub fn from_paragraphs<I, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: Inner::Paragraphs(paragraphs.into_iter().map(Into::into).collect()),
        }
    }

    pub fn from_reader<R>(reader: R, window: Duration) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        Self {
            inner: Inner::Stream {
                reader: Box::new(reader),
                window,
                pending: Vec::new(),
                failed: None,
            },
        }
    }

    /// Next batch, `None` once the source is exhausted.
    ///
    /// Stream sources return an empty batch when nothing arrived in the window.
    /// A read error first returns the lines received before it, then the error.
    pub async fn next_batch(&mut self) -> Result<Option<String>> {
        match &mut self.inner {
            Inner::Paragraphs(queue) => Ok(queue.pop_front()),
            Inner::Stream {
                reader,
                window,
                pending,
                failed,
            } => {
                if let Some(e) = failed.take() {
                    return Err(GpsError::Io(e));
                }
                read_window(reader, *window, pending, failed).await
            }
        }
    }
}

async fn read_window(
    reader: &mut LineReader,
    window: Duration,
    pending: &mut Vec<u8>,
    failed: &mut Option<std::io::Error>,
) -> Result<Option<String>> {
    let deadline = Instant::now() + window;
    let mut batch = String::new();

    loop {
        // read_until keeps partial bytes in `pending` when the timeout drops it
        match timeout_at(deadline, reader.read_until(b'\n', pending)).await {
            // Window closed
            Err(_) => break,
            Ok(Ok(0)) => {
                if !pending.is_empty() {
                    push_line(&mut batch, pending);
                }
                if batch.is_empty() {
                    return Ok(None);
                }
                break;
            }
            Ok(Ok(_)) => {
                if pending.ends_with(b"\n") {
                    push_line(&mut batch, pending);
                }
            }
            Ok(Err(e)) => {
                if batch.is_empty() {
                    return Err(GpsError::Io(e));
                }
                warn!("Read failed after {} line(s): {}", batch.lines().count(), e);
                *failed = Some(e);
                break;
            }
        }
    }

    debug!("Read batch of {} line(s)", batch.lines().count());
    Ok(Some(batch))
}

fn push_line(batch: &mut String, pending: &mut Vec<u8>) {
    batch.push_str(String::from_utf8_lossy(pending).trim_end());
    batch.push('\n');
    pending.clear();
}

/// Split replay text into paragraphs on blank lines.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push_str(line.trim_end());
            current.push('\n');
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}

/// Connect to a gpsd daemon and ask it to relay raw NMEA
pub async fn connect_gpsd(host: &str, port: u16) -> Result<BufReader<TcpStream>> {
    let mut stream = TcpStream::connect(format!("{}:{}", host, port))
        .await
        .map_err(|e| GpsError::Connection(format!("Failed to connect to gpsd at {}:{}: {}", host, port, e)))?;

    let watch_cmd = "?WATCH={\"enable\":true,\"nmea\":true}\n";
    stream
        .write_all(watch_cmd.as_bytes())
        .await
        .map_err(|e| GpsError::Connection(format!("Failed to send WATCH command: {}", e)))?;

    Ok(BufReader::new(stream))
}

/// List available serial ports
pub fn list_serial_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports()?;

    Ok(ports
        .into_iter()
        .map(|port| format!("{} - {:?}", port.port_name, port.port_type))
        .collect())
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::testing::UnpluggedReader;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_split_paragraphs() {
        let text = "$GPGGA,a\n$GPRMC,b\n\n\n$GPGGA,c\r\n   \n$GPVTG,d";
        assert_eq!(
            split_paragraphs(text),
            vec!["$GPGGA,a\n$GPRMC,b\n", "$GPGGA,c\n", "$GPVTG,d\n"]
        );
    }

    #[test]
    fn test_source_from_config() {
        let mut config = GpsConfig::default();
        assert_eq!(GpsSource::from_config(&config).unwrap(), GpsSource::Simulated);

        config.update_serial("/dev/ttyUSB0".to_string(), 4800);
        assert_eq!(
            GpsSource::from_config(&config).unwrap(),
            GpsSource::Serial {
                port: "/dev/ttyUSB0".to_string(),
                baudrate: 4800
            }
        );

        config.update_source("replay");
        config.replay_file = None;
        assert!(matches!(GpsSource::from_config(&config), Err(GpsError::Config(_))));

        config.update_source("carrier-pigeon");
        assert!(GpsSource::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_simulated_source_yields_all_paragraphs() {
        let mut source = BatchSource::open(&GpsSource::Simulated, Duration::from_millis(10))
            .await
            .unwrap();

        let mut count = 0;
        while let Some(batch) = source.next_batch().await.unwrap() {
            assert_eq!(batch, simulation::PARAGRAPHS[count]);
            count += 1;
        }
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_replay_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replay.nmea");
        std::fs::write(&path, format!("{}\n\n{}\n", simulation::PARAGRAPHS[0], simulation::PARAGRAPHS[1])).unwrap();

        let mut source = BatchSource::open(&GpsSource::Replay { path }, Duration::from_millis(10))
            .await
            .unwrap();

        assert!(source.next_batch().await.unwrap().unwrap().contains("3712.4058"));
        assert!(source.next_batch().await.unwrap().unwrap().contains("3712.4071"));
        assert!(source.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_replay_file() {
        let source = GpsSource::Replay {
            path: PathBuf::from("/definitely/not/here.nmea"),
        };
        let result = BatchSource::open(&source, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(GpsError::Connection(_))));
    }

    #[tokio::test]
    async fn test_stream_source_reads_until_eof() {
        let text = "$GPGGA,one\r\n$GPRMC,two\n$GPVTG,three";
        let mut source = BatchSource::from_reader(BufReader::new(text.as_bytes()), Duration::from_secs(5));

        assert_eq!(
            source.next_batch().await.unwrap(),
            Some("$GPGGA,one\n$GPRMC,two\n$GPVTG,three\n".to_string())
        );
        assert_eq!(source.next_batch().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stream_source_splits_on_window() {
        let (client, server) = tokio::io::duplex(256);
        let mut source = BatchSource::from_reader(BufReader::new(server), Duration::from_millis(50));
        let mut client = client;

        client.write_all(b"$GPGGA,first\n$GPGG").await.unwrap();
        assert_eq!(source.next_batch().await.unwrap(), Some("$GPGGA,first\n".to_string()));

        client.write_all(b"A,second\n").await.unwrap();
        drop(client);
        assert_eq!(source.next_batch().await.unwrap(), Some("$GPGGA,second\n".to_string()));
        assert_eq!(source.next_batch().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_error_keeps_lines_already_received() {
        let text = format!("{}\n", simulation::PARAGRAPHS[0]);
        let mut source = BatchSource::from_reader(
            BufReader::new(UnpluggedReader::new(&text)),
            Duration::from_secs(5),
        );

        let batch = source.next_batch().await.unwrap().unwrap();
        assert_eq!(batch.lines().count(), 4);
        assert!(batch.contains("3712.4058"));

        assert!(matches!(source.next_batch().await, Err(GpsError::Io(_))));
    }

    #[tokio::test]
    async fn test_read_error_with_nothing_received() {
        let mut source = BatchSource::from_reader(
            BufReader::new(UnpluggedReader::unplugged()),
            Duration::from_secs(5),
        );

        assert!(matches!(source.next_batch().await, Err(GpsError::Io(_))));
    }
}
