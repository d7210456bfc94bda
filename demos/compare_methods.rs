//! Compare different aggregation methods under attack

use fl_aggregation::{AggregationConfig, ClientUpdate};

fn main() {
    println!("Comparing Aggregation Methods\n");
    println!("Scenario: 7 honest clients (value=1.0), 3 Byzantine (value=100.0)\n");

    let mut updates: Vec<ClientUpdate> = (0..7)
        .map(|i| ClientUpdate::new(format!("honest_{}", i), vec![1.0]))
        .collect();
    updates.extend((0..3).map(|i| ClientUpdate::new(format!("byzantine_{}", i), vec![100.0])));

    let configs: Vec<(&str, AggregationConfig)> = vec![
        ("FedAvg (no defense)", AggregationConfig::new("fedavg")),
        ("Median", AggregationConfig::new("median")),
        (
            "Trimmed Mean (30%)",
            AggregationConfig::new("trimmed_mean").with_trim_fraction(0.3),
        ),
        (
            "Trimmed Mean (k=1)",
            AggregationConfig::new("trimmed_mean").with_trim_count(1),
        ),
    ];

    for (name, config) in configs {
        let policy = config.policy().unwrap();
        let result = policy.aggregate(&updates).unwrap();
        let value = result.params[0];

        let status = if (value - 1.0).abs() < 0.5 {
            "ROBUST"
        } else {
            "CORRUPTED"
        };

        println!("{:<25} Result: {:.2}  {}", name, value, status);
    }

    println!("\nMedian and 30% trimmed mean defend against a 30% attack; k=1 does not.");
}
