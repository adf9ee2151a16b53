//! Acquisition, parameter and frontend commands on top of a [`Session`].

use bytes::Bytes;
use dispatchwire_frame::identity::conf;
use dispatchwire_frame::{
    frontend_body, make_custom_body, make_parameter_request_body, make_start_acquisition_body,
    make_stop_acquisition_body, parse_buffer, AsicMask, BackupsId, FrontendCommand, ParsedBuffer,
    CONF_DISPATCHER, CUSTOM_TC, INTERN_TC, SEND_TO_SUBSYSTEM,
};
use dispatchwire_telemetry::{
    correlate, descriptor, voffset_to_adu, Correlation, DacShape, RelayState, TESDAC_AMPLITUDE,
    TESDAC_FREQUENCY,
};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::session::Session;

/// The raw acknowledgement for one command and its parsed frames.
#[derive(Debug, Clone)]
pub struct CommandReply {
    pub ack: Bytes,
    pub parsed: ParsedBuffer,
}

impl CommandReply {
    fn new(ack: Bytes) -> Self {
        let parsed = parse_buffer(ack.clone());
        Self { ack, parsed }
    }
}

/// Answer to a parameter request: the acknowledgement plus the readings
/// paired with the requested names.
#[derive(Debug, Clone)]
pub struct ParameterReply {
    pub reply: CommandReply,
    pub correlation: Correlation,
}

/// High-level dispatcher operations.
///
/// Owns its [`Session`] and remembers the identifier of the acquisition it
/// started, so it can be stopped later.
#[derive(Debug)]
pub struct DispatcherClient {
    session: Session,
    acquisition: Option<BackupsId>,
}

impl DispatcherClient {
    /// Wrap an existing session. It is not subscribed here.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            acquisition: None,
        }
    }

    /// Build a session from `config` and subscribe it.
    pub fn connect(config: SessionConfig) -> Result<Self> {
        let mut session = Session::new(config);
        session.subscribe()?;
        Ok(Self::new(session))
    }

    /// Borrow the underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access to the session, e.g. to resubscribe after a disconnect.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Give up the client and keep the session. Any acquisition id is forgotten.
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Identifier of the running acquisition, if this client started one.
    pub fn acquisition(&self) -> Option<BackupsId> {
        self.acquisition
    }

    /// Start an acquisition identified by the current time.
    pub fn start_acquisition(&mut self, session_name: &str, comment: &str) -> Result<CommandReply> {
        self.start_acquisition_with_id(BackupsId::now(), session_name, comment)
    }

    /// Start an acquisition with an explicit identifier.
    ///
    /// The identifier is only remembered once the dispatcher acknowledged.
    pub fn start_acquisition_with_id(
        &mut self,
        backups_id: BackupsId,
        session_name: &str,
        comment: &str,
    ) -> Result<CommandReply> {
        let body = make_start_acquisition_body(backups_id, session_name, comment)?;
        if let Some(previous) = self.acquisition {
            warn!(
                previous = previous.0,
                "starting an acquisition while another is active"
            );
        }

        let reply = self.command(INTERN_TC, &body)?;
        info!(backups_id = backups_id.0, session_name, "acquisition started");
        self.acquisition = Some(backups_id);
        Ok(reply)
    }

    /// Stop the acquisition this client started.
    ///
    /// Returns `Ok(None)` without touching the connection when none is active.
    pub fn stop_acquisition(&mut self) -> Result<Option<CommandReply>> {
        let Some(backups_id) = self.acquisition else {
            debug!("no active acquisition to stop");
            return Ok(None);
        };

        let reply = self.command(INTERN_TC, &make_stop_acquisition_body(backups_id))?;
        info!(backups_id = backups_id.0, "acquisition stopped");
        self.acquisition = None;
        Ok(Some(reply))
    }

    /// Ask for the current value of each named parameter.
    ///
    /// Unknown names are rejected before anything is sent.
    pub fn request_parameters<S: AsRef<str>>(&mut self, names: &[S]) -> Result<ParameterReply> {
        let body = parameter_body(conf::REQUEST_PARAMETERS, names)?;
        let reply = self.command(CONF_DISPATCHER, &body)?;
        let correlation = correlate(names, &reply.parsed.packets);
        Ok(ParameterReply { reply, correlation })
    }

    /// Ask the dispatcher to stream the named parameters.
    pub fn subscribe_parameters<S: AsRef<str>>(&mut self, names: &[S]) -> Result<CommandReply> {
        let body = parameter_body(conf::SUBSCRIBE_PARAMETERS, names)?;
        self.command(CONF_DISPATCHER, &body)
    }

    /// Stop streaming the named parameters.
    pub fn unsubscribe_parameters<S: AsRef<str>>(&mut self, names: &[S]) -> Result<CommandReply> {
        let body = parameter_body(conf::UNSUBSCRIBE_PARAMETERS, names)?;
        self.command(CONF_DISPATCHER, &body)
    }

    /// Send `command` to the listed ASICs (1-based).
    pub fn send_frontend(
        &mut self,
        asics: &[u8],
        command: &FrontendCommand,
    ) -> Result<CommandReply> {
        let mask = AsicMask::from_asics(asics)?;
        self.command(SEND_TO_SUBSYSTEM, &frontend_body(mask, command))
    }

    /// Set the TES bias DAC offset in volts.
    pub fn set_tes_dac_offset(&mut self, asics: &[u8], volts: f64) -> Result<CommandReply> {
        let adu = voffset_to_adu(volts);
        self.send_frontend(asics, &FrontendCommand::TesDacOffset { adu })
    }

    /// Set the TES bias DAC waveform, amplitude in volts and frequency in hertz.
    pub fn set_tes_dac_shape(
        &mut self,
        asics: &[u8],
        shape: DacShape,
        amplitude: f64,
        frequency: f64,
    ) -> Result<CommandReply> {
        let command = FrontendCommand::TesDacShape {
            shape: shape.code(),
            amplitude: TESDAC_AMPLITUDE.to_raw(amplitude),
            frequency: TESDAC_FREQUENCY.to_raw(frequency),
        };
        self.send_frontend(asics, &command)
    }

    /// Switch the feedback relay of the listed ASICs.
    pub fn set_feedback_relay(&mut self, asics: &[u8], state: RelayState) -> Result<CommandReply> {
        self.send_frontend(asics, &FrontendCommand::FeedbackRelay(state.code()))
    }

    /// Send an opaque custom telecommand.
    pub fn send_custom(&mut self, sub_id: u16, payload: &[u8]) -> Result<CommandReply> {
        self.command(CUSTOM_TC, &make_custom_body(sub_id, payload))
    }

    fn command(&mut self, id: u8, body: &[u8]) -> Result<CommandReply> {
        let ack = self.session.exchange(id, body)?;
        Ok(CommandReply::new(ack))
    }
}

fn parameter_body<S: AsRef<str>>(sub_id: u16, names: &[S]) -> Result<Bytes> {
    let codes = names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            descriptor(name)
                .map(|d| d.code)
                .ok_or_else(|| SessionError::UnknownParameter(name.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(make_parameter_request_body(sub_id, &codes)?)
}
