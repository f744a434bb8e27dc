use common::{Actor, PackKind, PromptError, PromptPack, PromptRegistry};
use tracing::{info, warn};

use crate::config::SeedConfig;

/// Packs described by the seed configuration. A kind is skipped unless all of
/// its fields are configured.
fn configured_packs(seed: &SeedConfig) -> Vec<PromptPack> {
    let mut packs = Vec::new();
    if let Some(direct) = &seed.direct_system_prompt {
        packs.push(PromptPack::direct(direct.clone()));
    }
    match (&seed.planner_system_prompt, &seed.painter_system_prompt) {
        (Some(planner), Some(painter)) => {
            packs.push(PromptPack::workflow(planner.clone(), painter.clone()));
        }
        (None, None) => {}
        _ => warn!("Workflow seed needs both planner and painter prompts, skipping"),
    }
    packs
}

/// Write and activate a first version for every configured kind that has none.
///
/// Kinds that already have history are left untouched, so restarts are no-ops.
pub async fn seed_default_prompts(
    registry: &PromptRegistry,
    seed: &SeedConfig,
) -> Result<(), PromptError> {
    let mut seeded = 0u32;

    for pack in configured_packs(seed) {
        let kind: PackKind = pack.kind();
        if !registry.list_versions(kind).await?.is_empty() {
            continue;
        }

        let (version, _) = registry
            .create_and_activate(pack, Actor::system(), Some("Seeded default".into()))
            .await?;
        info!(%kind, version_id = %version.id(), "Seeded default prompt version");
        seeded += 1;
    }

    if seeded > 0 {
        info!("Seeded {} prompt pack kinds", seeded);
    }

    Ok(())
}
