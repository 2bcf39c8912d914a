use flakeid::{FlakeId, FlakeIdConfig, FlakeIdError};

fn main() -> Result<(), FlakeIdError> {
    let config = FlakeIdConfig::builder()
        .start_time_str("2024-01-01T00:00:00")?
        .tenant_id(2)
        .build()?;

    // Node id resolves from the outbound IPv4 address, or randomly
    let generator = FlakeId::with_config(config)?;
    println!(
        "node {} ({}), tenant {}",
        generator.node_id(),
        generator.node_source(),
        generator.tenant_id()
    );

    let ids: Vec<i64> = (0..3).map(|_| generator.generate()).collect();

    println!("Generated IDs:");
    for id in ids {
        print_id(id, &generator)?;
    }
    Ok(())
}

fn print_id(id: i64, generator: &FlakeId) -> Result<(), FlakeIdError> {
    let parts = generator.codec().decompose(id);
    let when = generator.codec().timestamp(id)?;

    println!(
        "  ID: {id}, Ticks: {}, Time: {when}, Tenant: {}, Node: {}, Sequence: {}",
        parts.tick_delta, parts.tenant, parts.node, parts.sequence
    );
    Ok(())
}
