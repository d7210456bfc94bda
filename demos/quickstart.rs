//! Quickstart: flatten client models, aggregate, recover the global model

use fl_aggregation::{flatten, recover_state, AggregationPolicy, ClientUpdate, StateDict};
use ndarray::array;
use tracing_subscriber::EnvFilter;

fn client_model(w: f32, b: f32) -> StateDict {
    vec![
        ("fc.weight", array![[w, 2.0 * w, 3.0 * w]].into_dyn()),
        ("fc.bias", array![b].into_dyn()),
    ]
    .into_iter()
    .collect()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("fl-aggregation Quickstart Demo\n");

    let global = client_model(0.0, 0.0);
    let (_, layout) = flatten(&global).unwrap();
    println!("Layout: {} parameters, {} scalars", layout.len(), layout.total_len());

    // 7 honest clients with similar updates, 3 Byzantine with extreme values
    let mut updates: Vec<ClientUpdate> = (0..7)
        .map(|i| {
            let model = client_model(1.0 + i as f32 * 0.01, 0.5);
            ClientUpdate::new(format!("honest_{}", i), layout.flatten(&model).unwrap())
        })
        .collect();
    for i in 0..3 {
        let model = client_model(100.0, -100.0);
        updates.push(ClientUpdate::new(
            format!("byzantine_{}", i),
            layout.flatten(&model).unwrap(),
        ));
    }

    let result = AggregationPolicy::Median.aggregate(&updates).unwrap();
    let new_global = recover_state(&result.params, &layout, &global).unwrap();

    println!("Aggregated {} clients", result.n_contributors);
    for (name, tensor) in new_global.iter() {
        println!("   {}: {}", name, tensor);
    }
    println!("\nByzantine clients successfully ignored!");
}
