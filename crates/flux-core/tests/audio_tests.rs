use flux_core::audio::bin_range;
use flux_core::{AudioBands, AudioParams, BandExtractor};

const BINS: usize = 512;

fn spectrum(bass: u8, mid: u8, high: u8) -> Vec<u8> {
    (0..BINS)
        .map(|i| match i {
            0..=3 => bass,
            7..=57 => mid,
            90.. => high,
            _ => 0,
        })
        .collect()
}

#[test]
fn bands_average_their_bins() {
    let ex = BandExtractor::default();
    let bands = ex.measure(&spectrum(255, 51, 0));
    assert!((bands.bass - 1.0).abs() < 1e-6);
    assert!((bands.mid - 0.2).abs() < 1e-6);
    assert_eq!(bands.high, 0.0);
}

#[test]
fn high_band_is_boosted_and_capped() {
    let ex = BandExtractor::default();
    let bands = ex.measure(&spectrum(0, 0, 51));
    assert!((bands.high - 0.6).abs() < 1e-5, "0.2 boosted x3, got {}", bands.high);
    let loud = ex.measure(&spectrum(0, 0, 200));
    assert_eq!(loud.high, 1.0);
}

#[test]
fn smoothing_moves_sixty_percent_toward_the_reading() {
    let mut ex = BandExtractor::default();
    let frame = ex.process(&spectrum(255, 0, 0), 16.0);
    assert!((frame.bands.bass - 0.6).abs() < 1e-6);
    assert!((frame.raw.bass - 1.0).abs() < 1e-6);
    let frame = ex.process(&spectrum(255, 0, 0), 16.0);
    assert!((frame.bands.bass - 0.84).abs() < 1e-5);
}

#[test]
fn short_or_empty_spectra_read_as_silence() {
    let mut ex = BandExtractor::default();
    let frame = ex.process(&[], 16.0);
    assert_eq!(frame.bands, AudioBands::default());
    assert!(!frame.is_beat);
    let bands = ex.measure(&[255; 8]);
    assert!(bands.bass > 0.0);
    assert_eq!(bands.mid, 0.0, "mid range runs past an 8-bin spectrum");
}

#[test]
fn silence_clears_smoothed_bands() {
    let mut ex = BandExtractor::default();
    ex.process(&spectrum(255, 255, 255), 16.0);
    assert!(ex.bands().volume() > 0.0);
    ex.silence();
    assert_eq!(ex.bands(), AudioBands::default());
    assert_eq!(ex.bands().level(), 0.0);
}

#[test]
fn beats_are_held_off_for_a_tenth_of_a_second() {
    let mut ex = BandExtractor::default();
    let loud = spectrum(255, 0, 0);
    let mut beat_times = Vec::new();
    let mut now = 0.0;
    for _ in 0..60 {
        now += 16.0;
        if ex.process(&loud, 16.0).is_beat {
            beat_times.push(now);
        }
    }
    assert!(beat_times.len() >= 2, "sustained onset should re-trigger: {beat_times:?}");
    assert_eq!(beat_times[0], 16.0);
    for pair in beat_times.windows(2) {
        assert!(pair[1] - pair[0] > 100.0, "beats too close: {beat_times:?}");
    }
}

#[test]
fn quiet_bass_never_beats() {
    let mut ex = BandExtractor::default();
    let quiet = spectrum(60, 255, 255);
    for _ in 0..120 {
        assert!(!ex.process(&quiet, 16.0).is_beat);
    }
}

#[test]
fn ranges_follow_the_sample_rate() {
    let mut ex = BandExtractor::new(AudioParams::default());
    assert_eq!(bin_range(0.0, 172.0, 48_000.0 / 1024.0, BINS), 0..4);
    ex.set_sample_rate(22_050.0);
    // 21.5 Hz bins: 300..2500 Hz maps to bins 14..116.
    let mut bins = vec![0u8; BINS];
    bins[14..116].fill(255);
    let bands = ex.measure(&bins);
    assert!((bands.mid - 1.0).abs() < 1e-6);
}
