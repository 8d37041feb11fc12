use crate::constants::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

/// Microphone routed into an analyser node. The byte spectrum it produces is
/// what `flux_core::audio::BandExtractor` consumes.
pub struct MicAnalyser {
    _ctx: web::AudioContext,
    _source: web::MediaStreamAudioSourceNode,
    analyser: web::AnalyserNode,
    pub sample_rate: f32,
}

impl MicAnalyser {
    pub async fn connect() -> anyhow::Result<Self> {
        let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
        let devices = window
            .navigator()
            .media_devices()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let constraints = web::MediaStreamConstraints::new();
        constraints.set_audio(&wasm_bindgen::JsValue::TRUE);
        let promise = devices
            .get_user_media_with_constraints(&constraints)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let stream: web::MediaStream = JsFuture::from(promise)
            .await
            .map_err(|e| anyhow::anyhow!("microphone denied: {:?}", e))?
            .dyn_into()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;

        let ctx = web::AudioContext::new().map_err(|e| anyhow::anyhow!("{:?}", e))?;
        _ = ctx.resume();
        let source = ctx
            .create_media_stream_source(&stream)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let analyser = create_analyser(&ctx)?;
        source
            .connect_with_audio_node(&analyser)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let sample_rate = ctx.sample_rate();
        log::info!(
            "[audio] microphone connected: {} Hz, {} bins",
            sample_rate,
            analyser.frequency_bin_count()
        );
        Ok(Self {
            _ctx: ctx,
            _source: source,
            analyser,
            sample_rate,
        })
    }

    /// Fill `bins` with the current byte spectrum.
    pub fn read(&self, bins: &mut Vec<u8>) {
        bins.resize(self.analyser.frequency_bin_count() as usize, 0);
        self.analyser.get_byte_frequency_data(bins);
    }
}

fn create_analyser(ctx: &web::AudioContext) -> anyhow::Result<web::AnalyserNode> {
    let analyser = web::AnalyserNode::new(ctx).map_err(|e| anyhow::anyhow!("{:?}", e))?;
    analyser.set_fft_size(ANALYSER_FFT_SIZE);
    analyser.set_smoothing_time_constant(ANALYSER_SMOOTHING);
    analyser.set_min_decibels(ANALYSER_MIN_DECIBELS);
    analyser.set_max_decibels(ANALYSER_MAX_DECIBELS);
    Ok(analyser)
}
