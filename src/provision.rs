use rand_core::{OsRng, RngCore};

use crate::config::Config;
use crate::error::MprovError;
use crate::multipass::{LaunchSpec, Multipass, VmRecord};
use crate::request::{ProvisionRequest, VmDescriptor};

/// Look up a VM by exact name. Absence is `None`, not an error.
pub async fn find(multipass: &Multipass, name: &str) -> Result<Option<VmDescriptor>, MprovError> {
    let records = multipass.list().await?;
    Ok(match_record(&records, name))
}

/// Write the cloud-init document to a fresh temp file, launch, and
/// re-query for the authoritative descriptor. The launch command's own
/// output is never parsed for descriptor fields.
pub async fn create(
    multipass: &Multipass,
    request: &ProvisionRequest,
    image: &str,
) -> Result<Option<VmDescriptor>, MprovError> {
    let cloud_init = tempfile::NamedTempFile::new().map_err(|source| MprovError::Io {
        context: "creating cloud-init temp file".into(),
        source,
    })?;
    tokio::fs::write(cloud_init.path(), &request.init)
        .await
        .map_err(|source| MprovError::Io {
            context: format!(
                "writing cloud-init data to {}",
                cloud_init.path().display()
            ),
            source,
        })?;

    let spec = LaunchSpec {
        name: &request.name,
        cpus: &request.cpu,
        disk: &request.disk,
        memory: &request.mem,
        cloud_init: cloud_init.path(),
        image,
    };

    if let Err(e) = multipass.launch(&spec).await {
        // Keep the file so the failed attempt's cloud-init document can be
        // inspected.
        match cloud_init.keep() {
            Ok((_, path)) => {
                tracing::warn!(path = %path.display(), "launch failed, keeping cloud-init file")
            }
            Err(keep_err) => tracing::warn!(error = %keep_err.error, "launch failed"),
        }
        return Err(e);
    }

    cloud_init.close().map_err(|source| MprovError::Io {
        context: "removing cloud-init temp file".into(),
        source,
    })?;

    find(multipass, &request.name).await
}

/// Top-level pipeline: discover the VM, or jitter-sleep and create it.
pub async fn provision(
    multipass: &Multipass,
    config: &Config,
    request: &ProvisionRequest,
) -> Result<Option<VmDescriptor>, MprovError> {
    if let Some(descriptor) = find(multipass, &request.name).await? {
        tracing::info!(name = %request.name, state = %descriptor.state, "VM already exists");
        return Ok(Some(descriptor));
    }

    // Desynchronize concurrent invocations racing to create the same
    // name. Probabilistic only; the hypervisor's own idempotency decides
    // collisions.
    let secs = jitter_secs(config.jitter_min_s, config.jitter_max_s);
    if secs > 0 {
        tracing::debug!(secs, "presleep before create");
        tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
    }

    let descriptor = create(multipass, request, request.image_or(&config.default_image)).await?;
    if descriptor.is_none() {
        tracing::warn!(
            name = %request.name,
            "VM not visible after launch; emitting null"
        );
    }
    Ok(descriptor)
}

/// Uniform whole-second draw from `[min, max]`; `max = 0` disables.
fn jitter_secs(min: u64, max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    let span = max - min + 1;
    min + OsRng.next_u64() % span
}

fn match_record(records: &[VmRecord], name: &str) -> Option<VmDescriptor> {
    records
        .iter()
        .find(|record| record.name == name)
        .map(descriptor_from)
}

fn descriptor_from(record: &VmRecord) -> VmDescriptor {
    VmDescriptor {
        name: record.name.clone(),
        ip: record.ipv4.first().cloned().unwrap_or_default(),
        release: record.release.clone(),
        state: record.state.clone(),
    }
}
