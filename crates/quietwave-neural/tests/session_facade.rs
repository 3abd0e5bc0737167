use std::cell::{Cell, RefCell};
use std::fs;
use std::rc::Rc;

use ndarray::{Array1, Array2, Array3, ArrayD};
use quietwave_core::{valid_length, ShapeError, Topology};
use quietwave_neural::{
    DenoiseError, DenoiseSession, Denoiser, ExecutionTarget, InferenceBackend, SlotInfo, TensorBinding,
};
use tempfile::tempdir;

type Script = Box<dyn FnMut(Array3<f32>) -> Result<ArrayD<f32>, DenoiseError>>;

#[derive(Default, Clone)]
struct Tally {
    calls: Rc<Cell<usize>>,
    releases: Rc<Cell<usize>>,
    seen_shapes: Rc<RefCell<Vec<(usize, usize, usize)>>>,
    seen_bindings: Rc<RefCell<Vec<(String, String)>>>,
}

struct ScriptedBackend {
    inputs: Vec<SlotInfo>,
    outputs: Vec<SlotInfo>,
    script: Script,
    tally: Tally,
    panic_on_release: bool,
}

impl ScriptedBackend {
    fn new(tally: &Tally, script: Script) -> Self {
        Self {
            inputs: vec![SlotInfo::new("input", "Tensor<f32>(1, 1, -1)")],
            outputs: vec![SlotInfo::new("output", "Tensor<f32>(1, 1, -1)")],
            script,
            tally: tally.clone(),
            panic_on_release: false,
        }
    }

    fn echo(tally: &Tally) -> Self {
        Self::new(tally, Box::new(|input| Ok(input.into_dyn())))
    }

    fn with_slots(mut self, inputs: &[&str], outputs: &[&str]) -> Self {
        self.inputs = inputs.iter().map(|n| SlotInfo::new(*n, "Tensor<f32>")).collect();
        self.outputs = outputs.iter().map(|n| SlotInfo::new(*n, "Tensor<f32>")).collect();
        self
    }
}

impl InferenceBackend for ScriptedBackend {
    fn inputs(&self) -> &[SlotInfo] {
        &self.inputs
    }

    fn outputs(&self) -> &[SlotInfo] {
        &self.outputs
    }

    fn run(&mut self, binding: &TensorBinding, input: Array3<f32>) -> Result<ArrayD<f32>, DenoiseError> {
        self.tally.calls.set(self.tally.calls.get() + 1);
        self.tally.seen_shapes.borrow_mut().push(input.dim());
        self.tally
            .seen_bindings
            .borrow_mut()
            .push((binding.input().to_string(), binding.output().to_string()));
        (self.script)(input)
    }
}

impl Drop for ScriptedBackend {
    fn drop(&mut self) {
        self.tally.releases.set(self.tally.releases.get() + 1);
        if self.panic_on_release {
            panic!("engine release failed");
        }
    }
}

fn denoiser(backend: ScriptedBackend) -> Denoiser<ScriptedBackend> {
    let session = DenoiseSession::with_backend(backend).unwrap();
    Denoiser::new(session, Topology::DEMUCS)
}

#[test]
fn test_identity_network_round_trips_waveform() {
    let tally = Tally::default();
    let mut denoiser = denoiser(ScriptedBackend::echo(&tally));

    let lengths = [1usize, 2, 100, 597, 598, 16000, 16213, 44100];
    for &n in &lengths {
        let waveform: Vec<f32> = (0..n).map(|i| ((i % 97) as f32 - 48.0) / 48.0).collect();
        let cleaned = denoiser.denoise_samples(&waveform).unwrap();
        assert_eq!(cleaned, waveform, "length {}", n);
    }

    assert_eq!(tally.calls.get(), lengths.len());
    let shapes = tally.seen_shapes.borrow();
    for (&n, &shape) in lengths.iter().zip(shapes.iter()) {
        assert_eq!(shape, (1, 1, valid_length(n, &Topology::DEMUCS)));
    }
}

#[test]
fn test_engine_sees_zero_padded_tail() {
    let tally = Tally::default();
    let captured = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&captured);
    let backend = ScriptedBackend::new(
        &tally,
        Box::new(move |input| {
            sink.borrow_mut().extend(input.iter().copied());
            Ok(input.into_dyn())
        }),
    );
    let mut denoiser = denoiser(backend);

    let waveform = vec![0.5f32; 16000];
    denoiser.denoise_samples(&waveform).unwrap();

    let seen = captured.borrow();
    assert_eq!(seen.len(), 16213);
    assert!(seen[..16000].iter().all(|&s| s == 0.5));
    assert!(seen[16000..].iter().all(|&s| s == 0.0));
}

#[test]
fn test_dynamic_array_input() {
    let tally = Tally::default();
    let mut denoiser = denoiser(ScriptedBackend::echo(&tally));

    let waveform = Array1::from_vec(vec![0.1f32, -0.2, 0.3]).into_dyn();
    let cleaned = denoiser.denoise(waveform.view()).unwrap();
    assert_eq!(cleaned, vec![0.1, -0.2, 0.3]);
}

#[test]
fn test_empty_input_skips_engine() {
    let tally = Tally::default();
    let mut denoiser = denoiser(ScriptedBackend::echo(&tally));

    assert!(denoiser.denoise_samples(&[]).unwrap().is_empty());
    let empty = Array1::<f32>::zeros(0).into_dyn();
    assert!(denoiser.denoise(empty.view()).unwrap().is_empty());
    assert_eq!(tally.calls.get(), 0);
}

#[test]
fn test_stereo_input_is_rejected_before_engine() {
    let tally = Tally::default();
    let mut denoiser = denoiser(ScriptedBackend::echo(&tally));

    let stereo = Array2::<f32>::zeros((2, 100)).into_dyn();
    let err = denoiser.denoise(stereo.view()).unwrap_err();
    match err {
        DenoiseError::Shape(ShapeError::NotMono { shape }) => assert_eq!(shape, vec![2, 100]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(tally.calls.get(), 0);
}

#[test]
fn test_batched_output_is_shape_error() {
    let tally = Tally::default();
    let backend = ScriptedBackend::new(
        &tally,
        Box::new(|input| {
            let (_, _, t) = input.dim();
            Ok(Array3::<f32>::zeros((2, 1, t)).into_dyn())
        }),
    );
    let mut denoiser = denoiser(backend);

    let err = denoiser.denoise_samples(&[0.0; 64]).unwrap_err();
    assert!(matches!(
        err,
        DenoiseError::Shape(ShapeError::UnexpectedOutput { .. })
    ));
    assert!(err.to_string().contains("(1, 1, T)"));
}

#[test]
fn test_short_output_is_shape_error() {
    let tally = Tally::default();
    let backend = ScriptedBackend::new(&tally, Box::new(|_| Ok(Array3::<f32>::zeros((1, 1, 10)).into_dyn())));
    let mut denoiser = denoiser(backend);

    let err = denoiser.denoise_samples(&[0.0; 64]).unwrap_err();
    assert!(matches!(
        err,
        DenoiseError::Shape(ShapeError::OutputTooShort {
            available: 10,
            required: 64
        })
    ));
}

#[test]
fn test_engine_error_propagates_without_retry() {
    let tally = Tally::default();
    let backend = ScriptedBackend::new(
        &tally,
        Box::new(|_| Err(DenoiseError::Inference("kernel launch failed".into()))),
    );
    let mut denoiser = denoiser(backend);

    let err = denoiser.denoise_samples(&[0.25; 32]).unwrap_err();
    assert!(matches!(err, DenoiseError::Inference(_)));
    assert!(err.to_string().contains("kernel launch failed"));
    assert_eq!(tally.calls.get(), 1);
}

#[test]
fn test_engine_panic_becomes_inference_error() {
    let tally = Tally::default();
    let backend = ScriptedBackend::new(&tally, Box::new(|_| panic!("malformed graph")));
    let mut denoiser = denoiser(backend);

    let err = denoiser.denoise_samples(&[0.25; 32]).unwrap_err();
    assert!(matches!(err, DenoiseError::Inference(_)));
    assert!(err.to_string().contains("malformed graph"), "{}", err);

    // The session is still usable for the next call.
    assert!(!denoiser.session().is_closed());
}

#[test]
fn test_close_is_idempotent_and_blocks_infer() {
    let tally = Tally::default();
    let mut denoiser = denoiser(ScriptedBackend::echo(&tally));

    denoiser.close();
    denoiser.close();
    assert_eq!(tally.releases.get(), 1);
    assert!(denoiser.session().is_closed());
    assert!(denoiser.session().active_target().is_none());
    assert!(denoiser.session().inputs().is_empty());

    let err = denoiser.denoise_samples(&[0.1; 8]).unwrap_err();
    assert!(matches!(err, DenoiseError::SessionClosed));
    assert_eq!(tally.calls.get(), 0);

    drop(denoiser);
    assert_eq!(tally.releases.get(), 1);
}

#[test]
fn test_backend_without_metadata_reports_empty() {
    let tally = Tally::default();
    let session = DenoiseSession::with_backend(ScriptedBackend::echo(&tally)).unwrap();
    assert!(session.metadata().is_empty());
}

#[test]
fn test_drop_releases_once() {
    let tally = Tally::default();
    {
        let _session = DenoiseSession::with_backend(ScriptedBackend::echo(&tally)).unwrap();
    }
    assert_eq!(tally.releases.get(), 1);
}

#[test]
fn test_release_panic_is_swallowed() {
    let tally = Tally::default();
    let mut backend = ScriptedBackend::echo(&tally);
    backend.panic_on_release = true;
    let mut session = DenoiseSession::with_backend(backend).unwrap();

    session.close();
    assert!(session.is_closed());
    assert_eq!(tally.releases.get(), 1);
    session.close();
}

#[test]
fn test_binding_falls_back_to_first_declared_slot() {
    let tally = Tally::default();
    let backend = ScriptedBackend::echo(&tally).with_slots(&["x", "aux"], &["y", "MODEL_OUTPUT"]);
    let mut denoiser = denoiser(backend);

    assert_eq!(denoiser.session().binding().input(), "x");
    assert_eq!(denoiser.session().binding().output(), "MODEL_OUTPUT");

    denoiser.denoise_samples(&[0.0; 4]).unwrap();
    denoiser.denoise_samples(&[0.0; 4]).unwrap();
    let bindings = tally.seen_bindings.borrow();
    assert!(bindings
        .iter()
        .all(|(i, o)| i == "x" && o == "MODEL_OUTPUT"));
}

#[test]
fn test_model_without_outputs_fails_to_open() {
    let tally = Tally::default();
    let backend = ScriptedBackend::echo(&tally).with_slots(&["input"], &[]);
    let err = DenoiseSession::with_backend(backend).unwrap_err();
    match err {
        DenoiseError::IoTopology { inputs, outputs } => {
            assert_eq!(inputs, vec!["input".to_string()]);
            assert!(outputs.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
    // The rejected backend is still released.
    assert_eq!(tally.releases.get(), 1);
}

#[test]
fn test_open_garbage_model_is_engine_load_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("denoiser.onnx");
    fs::write(&path, b"this is not an onnx protobuf").unwrap();

    let err = DenoiseSession::open(&path, &[ExecutionTarget::Cpu]).unwrap_err();
    match err {
        DenoiseError::EngineLoad { path: failed, .. } => assert_eq!(failed, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_denoise_file_missing_input() {
    let tally = Tally::default();
    let mut denoiser = denoiser(ScriptedBackend::echo(&tally));
    let dir = tempdir().unwrap();

    let err = denoiser
        .denoise_file(&dir.path().join("missing.wav"), &dir.path().join("clean.wav"))
        .unwrap_err();
    assert!(matches!(err, DenoiseError::Decoder(_)));
    assert_eq!(tally.calls.get(), 0);
}

#[test]
fn test_denoise_file_round_trip() {
    let tally = Tally::default();
    let mut denoiser = denoiser(ScriptedBackend::echo(&tally));
    let dir = tempdir().unwrap();
    let input = dir.path().join("noisy.wav");
    let output = dir.path().join("clean.wav");

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&input, spec).unwrap();
    for i in 0..8000 {
        let s = ((i % 50) as i16 - 25) * 100;
        writer.write_sample(s).unwrap();
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();

    let report = denoiser.denoise_file(&input, &output).unwrap();
    assert_eq!(report.source_rate, 16000);
    assert_eq!(report.source_channels, 2);
    assert_eq!(report.samples, 8000);
    assert_eq!(tally.calls.get(), 1);

    let reader = hound::WavReader::open(&output).unwrap();
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.spec().sample_rate, 16000);
    assert_eq!(reader.len(), 8000);
}
