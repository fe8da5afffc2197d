//! Voice synthesis integration tests.
//!
//! Covers route selection per language, the request body contract, the
//! duration measurement of returned clips and the length-cap policy.

use pino::conversation::types::Language;
use pino::endpoint::{EndpointSource, ResolvedEndpoint};
use pino::error::CompanionError;
use pino::voice::VoiceSynthClient;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoint_for(server: &MockServer) -> ResolvedEndpoint {
    ResolvedEndpoint {
        base_url: server.uri(),
        source: EndpointSource::Local,
    }
}

/// Author a PCM WAV clip of the given length with hound.
fn wav_clip(seconds: f64) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("writer");
        let samples = (seconds * 16_000.0) as usize;
        for _ in 0..samples {
            writer.write_sample(0i16).expect("sample");
        }
        writer.finalize().expect("finalize");
    }
    cursor.into_inner()
}

#[tokio::test]
async fn korean_route_carries_body_and_measures_clip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getSound/ko"))
        .and(body_partial_json(serde_json::json!({
            "text": "안녕하세요",
            "char": "Pino",
            "lang": "ko",
            "speed": 1.0,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(wav_clip(2.0)))
        .expect(1)
        .mount(&server)
        .await;

    let client = VoiceSynthClient::new(1.0);
    let clip = client
        .synthesize(&endpoint_for(&server), "안녕하세요", "Pino", Language::Ko)
        .await
        .expect("synthesis succeeds");

    assert!((clip.duration_secs - 2.0).abs() < 1e-3);
    assert!(!clip.exceeds_cap());
}

#[tokio::test]
async fn english_shares_the_korean_route() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getSound/ko"))
        .and(body_partial_json(serde_json::json!({"lang": "en"})))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(wav_clip(1.0)))
        .expect(1)
        .mount(&server)
        .await;

    let client = VoiceSynthClient::new(1.0);
    client
        .synthesize(&endpoint_for(&server), "Hello", "Pino", Language::En)
        .await
        .expect("synthesis succeeds");
}

#[tokio::test]
async fn japanese_uses_its_own_route() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getSound/jp"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(wav_clip(1.0)))
        .expect(1)
        .mount(&server)
        .await;

    let client = VoiceSynthClient::new(1.0);
    client
        .synthesize(&endpoint_for(&server), "こんにちは", "Pino", Language::Jp)
        .await
        .expect("synthesis succeeds");
}

#[tokio::test]
async fn oversized_clip_is_flagged_by_the_cap() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getSound/ko"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(wav_clip(11.0)))
        .mount(&server)
        .await;

    let client = VoiceSynthClient::new(1.0);
    let clip = client
        .synthesize(&endpoint_for(&server), "long", "Pino", Language::Ko)
        .await
        .expect("synthesis succeeds");

    assert!(clip.duration_secs > 10.0);
    assert!(clip.exceeds_cap());
}

#[tokio::test]
async fn unparseable_clip_measures_as_zero() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getSound/ko"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not audio".to_vec()))
        .mount(&server)
        .await;

    let client = VoiceSynthClient::new(1.0);
    let clip = client
        .synthesize(&endpoint_for(&server), "hi", "Pino", Language::Ko)
        .await
        .expect("synthesis succeeds");

    assert_eq!(clip.duration_secs, 0.0);
    assert!(!clip.exceeds_cap());
}

#[tokio::test]
async fn error_status_is_a_voice_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getSound/ko"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = VoiceSynthClient::new(1.0);
    let err = client
        .synthesize(&endpoint_for(&server), "hi", "Pino", Language::Ko)
        .await
        .expect_err("503 is an error");

    assert!(matches!(err, CompanionError::Voice(_)));
}
