use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;
use vbus_client::{ConnectionBuilder, LiveDataStream};
use vbus_core::{Header, Telegram, VbusResult};
use vbus_transport::{ConnectionParams, IoTransport, StreamAccessor, TransportFactory};

/// Opens in-memory streams and hands the device end to the test
struct DuplexFactory {
    devices: mpsc::UnboundedSender<DuplexStream>,
}

#[async_trait]
impl TransportFactory for DuplexFactory {
    async fn open(&self, _params: &ConnectionParams) -> VbusResult<Box<dyn StreamAccessor>> {
        let (local, remote) = tokio::io::duplex(4096);
        self.devices.send(remote).unwrap();
        Ok(Box::new(IoTransport::new(local, None)))
    }
}

async fn connect(channel: u8) -> (LiveDataStream, DuplexStream) {
    let (devices, mut device_rx) = mpsc::unbounded_channel();
    let connection = ConnectionBuilder::new()
        .transport_factory("duplex", Arc::new(DuplexFactory { devices }))
        .channel(channel)
        .build()
        .unwrap();
    let stream = LiveDataStream::new(connection.clone());
    connection.connect().await.unwrap();
    let device = device_rx.recv().await.unwrap();
    (stream, device)
}

#[tokio::test]
async fn test_receive_telegram_split_across_chunks() {
    let (mut stream, mut device) = connect(1).await;
    let telegram = Telegram::new(0x0020, 0x7E11, 0x25, &[0x11, 0x22, 0x33, 0x44, 0x85, 0x66, 0x77]);
    let bytes = telegram.to_live_buffer();

    device.write_all(&bytes[..5]).await.unwrap();
    device.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    device.write_all(&bytes[5..]).await.unwrap();

    let received = stream
        .receive_live_data(Duration::from_secs(5))
        .await
        .unwrap()
        .unwrap();
    let received = received.as_telegram().unwrap();
    assert_eq!(received.channel(), 1);
    assert_eq!(received.command(), 0x25);
    assert_eq!(received.valid_frame_data(), telegram.valid_frame_data());
    stream.connection().disconnect();
}

#[tokio::test]
async fn test_receive_skips_corrupt_frames() {
    let (mut stream, mut device) = connect(0).await;
    let good = Telegram::new(0x0020, 0x1001, 0x05, &[]);
    let mut corrupt = Telegram::new(0x0020, 0x1001, 0x25, &[1, 2, 3]).to_live_buffer();
    corrupt[10] ^= 0x04;

    device.write_all(&corrupt).await.unwrap();
    device.write_all(&good.to_live_buffer()).await.unwrap();

    let received = stream
        .receive_live_data(Duration::from_secs(5))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received.as_telegram(), Some(&good));
    assert_eq!(stream.rejected_count(), 1);
    stream.connection().disconnect();
}

#[tokio::test]
async fn test_receive_telegram_matching_filters() {
    let (mut stream, mut device) = connect(0).await;
    let other = Telegram::new(0x0020, 0x7E11, 0x05, &[]);
    let wanted = Telegram::new(0x0020, 0x7E11, 0x45, &[9; 14]);

    device.write_all(&other.to_live_buffer()).await.unwrap();
    device.write_all(&wanted.to_live_buffer()).await.unwrap();

    let received = stream
        .receive_telegram_matching(|telegram| telegram.command() == 0x45, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(received, Some(wanted));
    stream.connection().disconnect();
}

#[tokio::test]
async fn test_receive_times_out() {
    let (mut stream, _device) = connect(0).await;

    let received = stream
        .receive_live_data(Duration::from_millis(50))
        .await
        .unwrap();
    assert!(received.is_none());
    stream.connection().disconnect();
}

#[tokio::test]
async fn test_send_telegram() {
    let (stream, mut device) = connect(0).await;
    let telegram = Telegram::new(0x7E11, 0x0020, 0x25, &[0x80, 0, 0, 0, 0, 0, 0]);

    stream.send_telegram(&telegram).unwrap();

    let mut received = vec![0u8; telegram.live_length()];
    tokio::time::timeout(Duration::from_secs(5), device.read_exact(&mut received))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received, telegram.to_live_buffer());
    stream.connection().disconnect();
}
