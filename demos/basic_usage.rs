use chrono::{Duration, Utc};
use mdm_client::metrics::{MetricIdentifier, SamplingType};
use mdm_client::query::{DimensionFilter, FilteredTimeSeriesQueryRequest};
use mdm_client::{MdmClient, MdmConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("MDM Client - Basic Usage Example");
    println!("================================");

    // Endpoint comes from MDM_ENDPOINT; defaults to a local stand-in.
    let config = MdmConfig::from_env();
    println!("Querying {}", config.endpoint);
    let client = MdmClient::new(config);

    let end_time = Utc::now();
    let start_time = end_time - Duration::hours(1);

    let request = FilteredTimeSeriesQueryRequest::new(
        vec![MetricIdentifier::new(
            "DemoAccount",
            "Compute/Frontend",
            "CpuPercent",
        )],
        start_time,
        end_time,
    )
    .with_resolution_minutes(1)
    .with_sampling_types(vec![SamplingType::sum(), SamplingType::count()])
    .with_dimension_filter(DimensionFilter::select("Host"))
    .with_top(10);

    println!(
        "\nRequesting {} over the last hour, split by host...",
        request.metrics[0].metric_name
    );

    match client.query_filtered_time_series(&request).await {
        Ok(response) => {
            println!(
                "Window {} .. {} at {} minute resolution",
                response.start_time, response.end_time, response.resolution_minutes
            );
            println!("{} series returned", response.time_series.len());

            for series in &response.time_series {
                let dimensions: Vec<String> = series
                    .dimensions()
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect();
                let points = series
                    .time_series_values(&SamplingType::sum())
                    .map(|values| values.len())
                    .unwrap_or(0);
                println!(
                    "  {} [{}]: {} points, evaluated {}",
                    series.metric().metric_name,
                    dimensions.join(", "),
                    points,
                    series.evaluated_result()
                );
            }
        }
        Err(e) => {
            println!("Query failed: {}", e);
            println!("(Set MDM_ENDPOINT to a reachable metrics frontend to run this demo.)");
        }
    }

    Ok(())
}
