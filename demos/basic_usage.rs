use restkit::{Headers, ParamValue, QueryParams, RequestBody, Resource};
use serde_json::json;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let httpbin = Resource::new("https://httpbin.org");

    println!("=== GET with repeated query parameters ===");

    let mut params = QueryParams::new();
    params.add("tag", ParamValue::from(vec!["rust", "http"]));
    params.add("page", ParamValue::from(1u32));
    params.add("unused", ParamValue::Missing);

    let mut headers = Headers::new();
    headers.add("Accept", "application/json".to_string());

    let result = httpbin.get(Some("get"), Some(&headers), &params).await?;
    println!("Status: {}", result.status_code());
    println!("First 200 chars: {}", result.chars().take(200).collect::<String>());

    println!("\n=== POST with JSON ===");

    let payload = RequestBody::from(json!({
        "name": "restkit",
        "language": "rust"
    }));
    let result = httpbin.post(Some("post"), Some(payload), None, &QueryParams::new()).await?;
    let echoed: serde_json::Value = result.json()?;
    println!("Echoed JSON: {}", echoed["json"]);

    println!("\n=== Child resources ===");

    let status = httpbin.child("status");
    println!("{} -> {}", httpbin, status);

    println!("\n=== Error Handling Example ===");

    match status.get(Some("404"), None, &QueryParams::new()).await {
        Ok(result) => println!("Unexpected success: {}", result.status_code()),
        Err(e) if e.is_not_found() => println!("Expected error for 404: {}", e),
        Err(e) => println!("Other error: {}", e),
    }

    match status.get(Some("403"), None, &QueryParams::new()).await {
        Ok(result) => println!("Unexpected success: {}", result.status_code()),
        Err(e) => println!("Unauthorized: {} (status {:?})", e.is_unauthorized(), e.status_code()),
    }

    println!("\n=== All examples completed successfully! ===");

    Ok(())
}
