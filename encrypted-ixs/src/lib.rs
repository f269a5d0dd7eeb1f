use arcis::*;

#[encrypted]
mod circuits {
    use arcis::*;

    /// Encrypted per-option vote counters. A prediction has 2 to 4 options;
    /// counters past its option count stay at zero.
    pub struct VoteTallies {
        counts: [u64; 4],
    }

    /// A voter's encrypted option index.
    pub struct UserChoice {
        option: u8,
    }

    /// Initialize all vote counters to encrypted zero.
    #[instruction]
    pub fn init_tallies(mxe: Mxe) -> Enc<Mxe, VoteTallies> {
        let tallies = VoteTallies { counts: [0, 0, 0, 0] };
        mxe.from_arcis(tallies)
    }

    /// Add one vote to the counter selected by the encrypted choice.
    ///
    /// The choice is never revealed. A choice outside `0..num_options` adds
    /// nothing, so a malformed ciphertext cannot inflate an unused counter.
    /// MPC executes every branch, so the selected index does not leak.
    #[instruction]
    pub fn submit_vote(
        choice_ctxt: Enc<Shared, UserChoice>,
        num_options: u8,
        tallies_ctxt: Enc<Mxe, VoteTallies>,
    ) -> Enc<Mxe, VoteTallies> {
        let choice = choice_ctxt.to_arcis();
        let mut tallies = tallies_ctxt.to_arcis();

        if choice.option < num_options {
            if choice.option == 0 {
                tallies.counts[0] += 1;
            } else if choice.option == 1 {
                tallies.counts[1] += 1;
            } else if choice.option == 2 {
                tallies.counts[2] += 1;
            } else if choice.option == 3 {
                tallies.counts[3] += 1;
            }
        }

        tallies_ctxt.owner.from_arcis(tallies)
    }

    /// Plaintext totals published when a prediction closes.
    pub struct RevealedTallies {
        option_0: u64,
        option_1: u64,
        option_2: u64,
        option_3: u64,
    }

    /// Publicly decrypt every counter. Only final totals leave the cluster.
    #[instruction]
    pub fn reveal_tallies(tallies_ctxt: Enc<Mxe, VoteTallies>) -> RevealedTallies {
        let tallies = tallies_ctxt.to_arcis();

        RevealedTallies {
            option_0: tallies.counts[0].reveal(),
            option_1: tallies.counts[1].reveal(),
            option_2: tallies.counts[2].reveal(),
            option_3: tallies.counts[3].reveal(),
        }
    }
}
