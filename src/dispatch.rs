//! Call dispatch: record, then respond.

use crate::error::Result;
use crate::ledger::Ledger;
use crate::record::{Call, InvocationRecord};
use crate::spy::Spy;
use crate::tracing_compat::debug;
use crate::value::Value;

impl Spy {
    /// Handles one call to `method_name`.
    ///
    /// The call is appended to the ledger before the responder runs, so it
    /// is recorded even when the responder raises. The responder's value or
    /// error is returned unchanged.
    ///
    /// The ledger lock is released before the responder runs; a responder
    /// may call back into the same spy.
    ///
    /// # Errors
    ///
    /// Whatever error the resolved responder raises.
    pub fn handle(&self, method_name: &str, args: Vec<Value>) -> Result<Value> {
        let responder = self.resolve(method_name).clone();
        let call = Call::new(method_name, args);

        let record = {
            let mut ledger = self.ledger.lock();
            let timestamp = self.clock.now();
            let current = std::mem::replace(&mut *ledger, Ledger::detached());
            *ledger = current.appended(method_name, call, timestamp);
            ledger.last_record().cloned()
        };

        debug!(
            spy = %self.id(),
            method = method_name,
            seq = record.as_ref().map(|r| r.id().seq()),
            responder = responder.kind(),
            "recorded call"
        );

        let args = record.as_ref().map_or(&[][..], InvocationRecord::args);
        responder.respond(args)
    }
}
