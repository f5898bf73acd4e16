use crate::media::{LocalMedia, LocalTrack, TrackKind};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

const OPUS_FRAME: Duration = Duration::from_millis(20);
/// A single 20 ms Opus frame of silence.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("no capture device available")]
    Unavailable,

    #[error("capture failed: {0}")]
    Capture(String),
}

#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> Result<LocalMedia, MediaError>;
}

/// Always fails; the session joins without a local stream.
pub struct NoMedia;

#[async_trait]
impl MediaSource for NoMedia {
    async fn acquire(&self) -> Result<LocalMedia, MediaError> {
        Err(MediaError::Unavailable)
    }
}

/// Headless capture: an Opus track that sends silence and an idle VP8 track.
pub struct SyntheticMedia {
    stream_id: String,
}

impl SyntheticMedia {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
        }
    }

    pub fn audio_track(stream_id: &str) -> LocalTrack {
        let rtc = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            "audio".to_owned(),
            stream_id.to_owned(),
        ));
        LocalTrack::with_rtc("audio", TrackKind::Audio, rtc)
    }

    pub fn video_track(stream_id: &str) -> LocalTrack {
        let rtc = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
            "video".to_owned(),
            stream_id.to_owned(),
        ));
        LocalTrack::with_rtc("video", TrackKind::Video, rtc)
    }
}

#[async_trait]
impl MediaSource for SyntheticMedia {
    async fn acquire(&self) -> Result<LocalMedia, MediaError> {
        let audio = Self::audio_track(&self.stream_id);
        let video = Self::video_track(&self.stream_id);

        let Some(rtc) = audio.rtc().cloned() else {
            return Err(MediaError::Capture("audio track has no RTP sink".to_owned()));
        };
        let pump = audio.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(OPUS_FRAME);
            loop {
                ticker.tick().await;
                if pump.is_stopped() {
                    debug!("Synthetic audio stopped");
                    break;
                }
                if !pump.is_enabled() {
                    continue;
                }
                let sample = Sample {
                    data: Bytes::from_static(&OPUS_SILENCE),
                    duration: OPUS_FRAME,
                    ..Default::default()
                };
                if let Err(e) = rtc.write_sample(&sample).await {
                    debug!("Synthetic audio write failed: {}", e);
                }
            }
        });

        Ok(LocalMedia::new(self.stream_id.clone(), vec![audio, video]))
    }
}
