use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use veriface_core::{
    check_liveness, compare_faces, face_encoding, load_image, locate_face, SeetaFaceDetector,
    Verdict,
};

#[derive(Parser)]
#[command(name = "veriface", about = "Veriface identity-proofing CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score the liveness of an image
    Liveness {
        /// Image file to score
        image: PathBuf,
    },
    /// Locate the most prominent face in an image
    Detect {
        /// Image file to search
        image: PathBuf,
        /// SeetaFace model file
        #[arg(long, default_value = "models/seeta_fd_frontal_v1.0.bin")]
        model: PathBuf,
    },
    /// Verify a selfie against a reference photo
    Verify {
        /// Reference photo (e.g. an ID card)
        reference: PathBuf,
        /// Live selfie
        selfie: PathBuf,
        /// SeetaFace model file
        #[arg(long, default_value = "models/seeta_fd_frontal_v1.0.bin")]
        model: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Liveness { image } => {
            let img = load_image(&image)
                .with_context(|| format!("could not load image: {}", image.display()))?;
            let result = check_liveness(&img);
            println!(
                "{}",
                serde_json::json!({
                    "is_live": result.is_live,
                    "score": result.score,
                    "message": result.message,
                })
            );
        }
        Commands::Detect { image, model } => {
            let detector = SeetaFaceDetector::load(&model)?;
            let img = load_image(&image)
                .with_context(|| format!("could not load image: {}", image.display()))?;
            match locate_face(&img, &detector) {
                Some(region) => println!(
                    "{}",
                    serde_json::json!({
                        "x": region.x, "y": region.y,
                        "width": region.width, "height": region.height,
                    })
                ),
                None => println!("{}", serde_json::json!({ "message": "No face found." })),
            }
        }
        Commands::Verify { reference, selfie, model } => {
            let detector = SeetaFaceDetector::load(&model)?;

            let reference_img = load_image(&reference)
                .with_context(|| format!("could not load reference: {}", reference.display()))?;
            let selfie_img = load_image(&selfie)
                .with_context(|| format!("could not load selfie: {}", selfie.display()))?;

            let liveness = check_liveness(&selfie_img);

            let reference_encoding = face_encoding(&reference_img, &detector);
            if reference_encoding.is_none() {
                bail!("No face found in reference photo.");
            }
            let selfie_encoding = face_encoding(&selfie_img, &detector);
            if selfie_encoding.is_none() {
                bail!("No face found in selfie.");
            }

            let matched = compare_faces(reference_encoding.as_ref(), selfie_encoding.as_ref());
            let verdict = Verdict::from_signals(matched, liveness.is_live);

            println!(
                "{}",
                serde_json::json!({
                    "result": verdict.label(),
                    "status": verdict.status().as_str(),
                    "message": format!("{} (Score: {:.2})", liveness.message, liveness.score),
                })
            );
        }
    }

    Ok(())
}
