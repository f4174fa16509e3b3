use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use kdknn::classify::evaluate;
use kdknn::dataset::load_idx_files;
use kdknn::kdtree::{KDTree, KDTreeIndex};
use log::info;

/// Pixels in one 28x28 MNIST image.
const MNIST_PIXELS: usize = 784;

/// Classify the MNIST test set with a k-nearest-neighbor vote over a KD-Tree of the training set.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "mnist_data/train-images-idx3-ubyte")]
    train_images: PathBuf,

    #[arg(long, default_value = "mnist_data/train-labels-idx1-ubyte")]
    train_labels: PathBuf,

    #[arg(long, default_value = "mnist_data/t10k-images-idx3-ubyte")]
    test_images: PathBuf,

    #[arg(long, default_value = "mnist_data/t10k-labels-idx1-ubyte")]
    test_labels: PathBuf,

    /// Number of nearest neighbors that vote on each label
    #[arg(short, default_value_t = 1)]
    k: usize,

    /// Only evaluate the first N test images
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let train = load_idx_files::<MNIST_PIXELS>(&args.train_images, &args.train_labels)?;
    let mut test = load_idx_files::<MNIST_PIXELS>(&args.test_images, &args.test_labels)?;
    if let Some(limit) = args.limit {
        test.truncate(limit);
    }
    println!("Training set size: {}", train.len());
    println!("Test set size: {}", test.len());

    let start = Instant::now();
    let tree: KDTree<f64, MNIST_PIXELS, u8> = KDTree::from_points(train);
    info!(
        "Built KD-Tree with {} points and depth {} in {:.2?}",
        tree.len(),
        tree.depth(),
        start.elapsed()
    );

    println!("Evaluating kNN on the test set (k = {})", args.k);
    let start = Instant::now();
    let evaluation = evaluate(&tree, &test, args.k);
    println!("Test set accuracy: {:.2}", evaluation.accuracy());
    println!("Time elapsed in s: {:.3}", start.elapsed().as_secs_f64());

    Ok(())
}
