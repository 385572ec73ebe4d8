//! Main pursuit executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Open the gimbal link, continuing without actuation if it cannot be opened
//!     - Connect to the ground truth pose helper if enabled
//!     - Main loop:
//!         - Host command processing (hand frames, keys, toggles) from the script
//!         - Chest angle polling
//!     - Export any running recording and close the link
//!
//! # Usage
//!
//! ```text
//! pursuit_exec <script> [--params <file>]
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::path::PathBuf;
use std::thread;
use std::time::Instant;
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{debug, info, trace, warn};
use structopt::StructOpt;

// Internal
use pursuit_lib::{
    control_loop::ControlLoop,
    gimbal_link::{GimbalLink, serial::SerialPortTransport},
    params::PursuitExecParams,
    track_coord::TrackCoord,
    truth_client::TruthClient,
};
use util::{
    archive::CsvSink,
    logger::{logger_init, LevelFilter},
    module::State,
    session::{self, Session},
    script_interpreter::{ScriptInterpreter, PendingCmds},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line options
#[derive(Debug, StructOpt)]
#[structopt(name = "pursuit_exec", about = "Hand pursuit gimbal controller")]
struct Opts {
    /// Host command script to replay
    #[structopt(parse(from_os_str))]
    script: PathBuf,

    /// Parameter file, relative to `$PURSUIT_SW_ROOT/params`
    #[structopt(short, long, default_value = "pursuit_exec.toml")]
    params: String,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    let opts = Opts::from_args();

    // Initialise session
    let session = Session::new(
        "pursuit_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Pursuit Sensing Gimbal Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let params: PursuitExecParams = util::params::load(&opts.params)
        .wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- LOAD SCRIPT ----

    info!("Loading script from {:?}", opts.script);

    let mut si = ScriptInterpreter::new(&opts.script)
        .wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} commands\n",
        si.get_duration(),
        si.get_num_cmds()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut track_coord = TrackCoord::default();
    track_coord.init(params.control.clone(), &session)
        .wrap_err("Failed to initialise TrackCoord")?;
    info!("TrackCoord init complete");

    // A missing gimbal is not fatal, the loop keeps tracking without actuation
    let mut link = GimbalLink::new(
        SerialPortTransport::new(&params.serial.port, params.serial.baud_rate),
        &params.serial
    );
    match link.open() {
        Ok(()) => info!("Gimbal link open on {}", params.serial.port),
        Err(e) => warn!(
            "Could not open the gimbal link on {}, running without a gimbal: {}",
            params.serial.port,
            e
        )
    }

    let mut control_loop = ControlLoop::new(
        params.control_loop.clone(),
        track_coord,
        link,
        params.imu.clone(),
        params.recorder.clone(),
        Box::new(CsvSink::from_session(&session, &params.recorder.file_stem)),
    );

    if params.truth.enabled {
        match TruthClient::connect(&params.truth) {
            Ok(c) => {
                info!("Ground truth client connected");
                control_loop.set_truth_client(Some(c));
            },
            Err(e) => warn!("Ground truth unavailable: {}", e)
        }
    }

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    let cycle_period = params.cycle.period().ok_or_else(|| eyre!(
        "The cycle period must be finite and positive, found {}", params.cycle.cycle_period_s
    ))?;
    let poll_cycles = params.cycle.telemetry_poll_cycles.max(1);
    let mut num_cycles: u64 = 0;

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- HOST COMMAND PROCESSING ----

        match si.get_pending_cmds(session::get_elapsed_seconds()) {
            PendingCmds::None => (),
            PendingCmds::Some(cmds) => {
                for cmd in cmds {
                    control_loop.apply(cmd);
                }
            },
            PendingCmds::EndOfScript => {
                info!("End of script reached, stopping");
                break
            }
        }

        // ---- CHEST ANGLE POLLING ----

        if num_cycles % poll_cycles == 0 {
            control_loop.poll_chest();
        }

        trace!(
            "pitch: {:.1}, yaw: {:.1}, speed: {:.1} mm/s, referential yaw: {:.1}, status: {}",
            control_loop.pitch(),
            control_loop.yaw(),
            control_loop.speed(),
            control_loop.referential_yaw(),
            control_loop.status()
        );

        num_cycles += 1;

        // ---- CYCLE MANAGEMENT ----

        // Sleep for the rest of the cycle
        match cycle_period.checked_sub(cycle_start_instant.elapsed()) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_start_instant.elapsed().as_secs_f64() - cycle_period.as_secs_f64()
            )
        }
    }

    // ---- SHUTDOWN ----

    control_loop.shutdown();

    info!(
        "Final state: {}",
        serde_json::to_string(control_loop.state())
            .wrap_err("Could not serialise the final state")?
    );

    info!("End of execution");

    Ok(())
}
