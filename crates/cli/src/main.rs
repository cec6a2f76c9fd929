use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use castwatch_core::annotation::infrastructure::box_label_annotator::BoxLabelAnnotator;
use castwatch_core::dataset::dataset_descriptor::{DatasetDescriptor, LabeledDataset};
use castwatch_core::dataset::sample_loader::SampleLoader;
use castwatch_core::detection::domain::detection_params::DetectionParams;
use castwatch_core::detection::domain::face_extractor::FaceExtractor;
use castwatch_core::detection::infrastructure::model_resolver::ModelResolver;
use castwatch_core::detection::infrastructure::rustface_detector::RustfaceDetector;
use castwatch_core::normalization::face_normalizer::FaceNormalizer;
use castwatch_core::pipeline::annotate_video_use_case::AnnotateVideoUseCase;
use castwatch_core::pipeline::build_dataset_use_case::BuildDatasetUseCase;
use castwatch_core::pipeline::evaluate_model_use_case::EvaluateModelUseCase;
use castwatch_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use castwatch_core::pipeline::train_model_use_case::{TrainModelUseCase, Validation};
use castwatch_core::recognition::domain::algorithm_kind::AlgorithmKind;
use castwatch_core::recognition::infrastructure::model_store::ModelStore;
use castwatch_core::recognition::recognizer_model::RecognizerModel;
use castwatch_core::shared::constants::{SEETA_MODEL_NAME, SEETA_MODEL_URL};
use castwatch_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use castwatch_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use castwatch_core::video::infrastructure::image_file_reader::ImageFileReader;
use castwatch_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Train face recognizers on labeled photos and name the faces in videos.
#[derive(Parser)]
#[command(name = "castwatch", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Overlapping detections needed before a face is reported.
    #[arg(long, global = true, default_value = "1")]
    min_neighbors: usize,

    /// Size ratio between pyramid levels (greater than 1.0).
    #[arg(long, global = true, default_value = "1.25")]
    scale_factor: f32,

    /// Smallest face side, in pixels, the detector looks for.
    #[arg(long, global = true, default_value = "20")]
    min_face_size: u32,

    /// Detector model file; downloaded into the cache when omitted.
    #[arg(long, global = true)]
    detector_model: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Crop and normalize the faces in a folder of photos.
    BuildDataset {
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Train a model on labeled datasets and save it.
    Train {
        #[arg(long)]
        algorithm: AlgorithmKind,
        #[command(flatten)]
        datasets: DatasetArgs,
        /// Model name, saved as <name>.json and <name>.bin.
        #[arg(long)]
        output: String,
        #[arg(long, default_value = "models")]
        models_dir: PathBuf,
        /// Cross-validate with this many folds before training.
        #[arg(long)]
        folds: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Report k-fold cross-validation accuracy without saving a model.
    Evaluate {
        #[arg(long)]
        algorithm: AlgorithmKind,
        #[command(flatten)]
        datasets: DatasetArgs,
        #[arg(long, default_value = "5")]
        folds: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Write a copy of a video with every face boxed and named.
    AnalyseVideo {
        #[arg(long)]
        video: PathBuf,
        /// Model name in --models-dir, or a path such as models/cast.
        #[arg(long)]
        model: PathBuf,
        #[arg(long, default_value = "models")]
        models_dir: PathBuf,
        /// Scores at or above this distance are reported as Unknown.
        #[arg(long)]
        confidence: f64,
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct DatasetArgs {
    /// JSON descriptor listing a label and folder per person.
    #[arg(long = "datasets")]
    descriptor: PathBuf,
    /// Directory the descriptor's folders are relative to (default: the
    /// descriptor's own directory).
    #[arg(long)]
    datasets_root: Option<PathBuf>,
}

impl DatasetArgs {
    fn resolve(&self) -> Result<Vec<LabeledDataset>, Box<dyn std::error::Error>> {
        if !self.descriptor.is_file() {
            return Err(format!("Dataset descriptor not found: {}", self.descriptor.display()).into());
        }
        let root = match &self.datasets_root {
            Some(root) => root.clone(),
            None => self
                .descriptor
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        Ok(DatasetDescriptor::load(&self.descriptor)?.resolve(&root)?)
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let params = DetectionParams {
        min_neighbors: cli.min_neighbors,
        scale_factor: cli.scale_factor,
        min_face_size: cli.min_face_size,
        ..DetectionParams::default()
    };
    params.validate()?;
    let detector_model = cli.detector_model.as_deref();

    match &cli.command {
        Command::BuildDataset { source, output } => {
            let loader = build_loader(&params, detector_model)?;
            let mut use_case = BuildDatasetUseCase::new(
                loader,
                Box::new(ImageFileWriter::new()),
                Box::new(StdoutPipelineLogger::default()),
            );
            let stored = use_case.execute(source, output)?;
            println!("Stored {stored} faces in {}", output.display());
        }
        Command::Train {
            algorithm,
            datasets,
            output,
            models_dir,
            folds,
            seed,
        } => {
            let datasets = datasets.resolve()?;
            let loader = build_loader(&params, detector_model)?;
            let mut use_case = TrainModelUseCase::new(
                loader,
                ModelStore::new(models_dir),
                Box::new(StdoutPipelineLogger::default()),
            );
            let validation = folds.map(|folds| Validation { folds, seed: *seed });
            let outcome = use_case.execute(*algorithm, &datasets, output, validation)?;
            if let Some(report) = &outcome.evaluation {
                println!("Cross-validation accuracy: {:.3}", report.accuracy);
            }
            println!(
                "Trained {algorithm} on {} faces of {} people; saved as {}",
                outcome.faces,
                outcome.labels.len(),
                ModelStore::new(models_dir).record_path(output).display()
            );
        }
        Command::Evaluate {
            algorithm,
            datasets,
            folds,
            seed,
        } => {
            let datasets = datasets.resolve()?;
            let loader = build_loader(&params, detector_model)?;
            let mut use_case =
                EvaluateModelUseCase::new(loader, Box::new(StdoutPipelineLogger::default()));
            let report = use_case.execute(*algorithm, &datasets, *folds, *seed)?;
            for (i, score) in report.fold_scores.iter().enumerate() {
                println!("Fold {}: {score:.3}", i + 1);
            }
            if report.untested > 0 {
                println!("Samples never tested: {}", report.untested);
            }
            println!("{algorithm} accuracy: {:.3}", report.accuracy);
        }
        Command::AnalyseVideo {
            video,
            model,
            models_dir,
            confidence,
            output,
        } => {
            if !video.is_file() {
                return Err(format!("Input video not found: {}", video.display()).into());
            }
            if confidence.is_nan() {
                return Err("Confidence must be a number".into());
            }
            let model = open_model(model, models_dir)?;
            let extractor = build_extractor(&params, detector_model)?;
            let mut use_case = AnnotateVideoUseCase::new(
                Box::new(FfmpegReader::new()),
                Box::new(FfmpegWriter::new()),
                extractor,
                model,
                Box::new(BoxLabelAnnotator::default()),
                Box::new(StdoutPipelineLogger::default()),
                *confidence,
            );
            let summary = use_case.execute(video, output)?;
            println!(
                "Wrote {} frames to {} ({} faces, {} identified)",
                summary.frames_written,
                output.display(),
                summary.faces_detected,
                summary.faces_identified
            );
        }
    }

    Ok(())
}

/// A bare name is looked up in `models_dir`; anything with a directory
/// part is taken as a path.
fn open_model(
    model: &Path,
    models_dir: &Path,
) -> Result<RecognizerModel, Box<dyn std::error::Error>> {
    let has_dir = model.parent().is_some_and(|p| !p.as_os_str().is_empty());
    let (store, name) = if has_dir {
        ModelStore::for_model_path(model)
    } else {
        (
            ModelStore::new(models_dir),
            model.to_string_lossy().into_owned(),
        )
    };
    Ok(store.load(&name)?)
}

fn build_extractor(
    params: &DetectionParams,
    explicit_model: Option<&Path>,
) -> Result<FaceExtractor, Box<dyn std::error::Error>> {
    let resolver = ModelResolver::new()?.with_progress(Box::new(download_progress));
    log::info!("Resolving model: {SEETA_MODEL_NAME}");
    let model_path = resolver.resolve(SEETA_MODEL_NAME, SEETA_MODEL_URL, explicit_model)?;
    let detector = RustfaceDetector::new(&model_path, params)?;
    Ok(FaceExtractor::new(
        Box::new(detector),
        FaceNormalizer::default(),
    ))
}

fn build_loader(
    params: &DetectionParams,
    explicit_model: Option<&Path>,
) -> Result<SampleLoader, Box<dyn std::error::Error>> {
    Ok(SampleLoader::new(
        Box::new(ImageFileReader::new()),
        build_extractor(params, explicit_model)?,
    ))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
