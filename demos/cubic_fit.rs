//! Example of fitting a cubic with uncertainties on both axes.
//!
//! Generates noisy cubic data, fits it by orthogonal distance regression,
//! prints the fit report and refines the parameter uncertainties with a
//! leave-one-out jackknife.
//!
//! Run with `RUST_LOG=info cargo run --example cubic_fit` to see the log output.

use ndarray::Array1;
use odrfit::{
    nominal_values, std_devs, FitData, FitOptions, Fittable, JackknifeOptions, Model, Polynomial,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Cubic fit example");
    println!("=================\n");

    // y = 0.5 x^3 - 1.2 x^2 + 3 x + 2.5, coefficients from the constant term up
    let truth = [2.5, 3.0, -1.2, 0.5];
    let n = 50;

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let noise = Normal::new(0.0, 5.0)?;

    let x = Array1::<f64>::linspace(-5.0, 5.0, n);
    let y = odrfit::polynomial(&truth, &x).mapv(|v| v + noise.sample(&mut rng));
    let err_x = Array1::from_elem(n, 0.05);
    let err_y = Array1::from_elem(n, 5.0);

    let data = FitData::new(x.clone(), y)
        .with_x_errors(err_x)
        .with_y_errors(err_y);

    let model = Polynomial::with_degree(3);
    println!("{}\n", model.describe());

    let p0 = [1.0, 1.0, -1.0, 1.0];
    let result = model.fit_odr(&data, &p0, &FitOptions::default())?;
    println!("{}\n", result);

    println!("True coefficients:   {:?}", truth);
    println!("Fitted coefficients: {:?}", nominal_values(result.parameters()));
    println!("Standard deviations: {:?}\n", std_devs(result.parameters()));

    // Fitted curve on a finer grid, as a plotting layer would use it
    let grid = Array1::<f64>::linspace(-5.0, 5.0, 11);
    let curve = result.predict(&model, &grid);
    println!("Fitted curve:");
    for (xv, yv) in grid.iter().zip(curve.iter()) {
        println!("  x = {:>5.1}  y = {:>9.3}", xv, yv);
    }
    println!();

    let jk = result.jackknife(&model, &data, &JackknifeOptions::new().with_parallel(true))?;
    println!("Jackknife estimates ({} subsets):", jk.fits.len());
    for (i, p) in jk.parameters.iter().enumerate() {
        println!("  p{} = {}", i + 1, p);
    }

    Ok(())
}
