use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("lookuplink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: lookuplink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("LOOKUPLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "protocol_magic: {:?}",
        String::from_utf8_lossy(lookuplink_frame::MAGIC_V1)
    );
    println!(
        "default_max_body_size: {}",
        lookuplink_frame::DEFAULT_MAX_BODY_SIZE
    );
    println!(
        "default_timeout: {:?}",
        lookuplink_transport::LOOKUP_TIMEOUT
    );

    Ok(SUCCESS)
}
