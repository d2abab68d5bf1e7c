use santa_http::{ErrorMessages, SantaClient, GATEWAY_TIMEOUT};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let group_id: i64 = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: draw <group-id>"))?
        .parse()?;

    let client = SantaClient::from_env().map_err(anyhow::Error::msg)?;
    let messages = ErrorMessages::new()
        .with(GATEWAY_TIMEOUT, "The server took too long to answer, try again.")
        .with("FORBIDDEN", "Only the group creator can run the draw.");

    let validation = match client.validate_draw(group_id).await {
        Ok(validation) => validation,
        Err(err) => {
            let shown = err.normalize(&messages);
            anyhow::bail!("[{}] {}", shown.code, shown.message);
        }
    };

    if !validation.valid {
        println!(
            "draw not possible: {} ({})",
            validation.message,
            validation.details.unwrap_or_default()
        );
        return Ok(());
    }

    match client.execute_draw(group_id).await {
        Ok(result) => println!(
            "{} at {}, {} participants notified",
            result.message, result.drawn_at, result.participants_notified
        ),
        Err(err) => {
            let shown = err.normalize(&messages);
            anyhow::bail!("[{}] {}", shown.code, shown.message);
        }
    }

    Ok(())
}
