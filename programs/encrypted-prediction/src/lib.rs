// Anchor's macros emit cfgs that rustc doesn't know about
#![allow(unexpected_cfgs)]

use anchor_lang::prelude::*;
use arcium_anchor::prelude::*;
use arcium_client::idl::arcium::types::CallbackAccount;

pub mod constants;
pub mod error;
pub mod events;
pub mod state;

use constants::*;
pub use error::ErrorCode;
pub use events::*;
pub use state::{LedgerAccount, PredictionAccount, PredictionView, VoterRecord};

declare_id!("CijM432yX1h7ZgH1GymGQihrn9moFPZPxGZDFuUUbCTN");

#[arcium_program]
pub mod encrypted_prediction {
    use super::*;

    // ================================================================
    // Setup
    // ================================================================

    pub fn init_tallies_comp_def(ctx: Context<InitTalliesCompDef>) -> Result<()> {
        init_comp_def(ctx.accounts, None, None)?;
        Ok(())
    }

    pub fn init_vote_comp_def(ctx: Context<InitVoteCompDef>) -> Result<()> {
        init_comp_def(ctx.accounts, None, None)?;
        Ok(())
    }

    pub fn init_reveal_comp_def(ctx: Context<InitRevealCompDef>) -> Result<()> {
        init_comp_def(ctx.accounts, None, None)?;
        Ok(())
    }

    /// Create the ledger index. Called once per deployment.
    pub fn initialize_ledger(ctx: Context<InitializeLedger>) -> Result<()> {
        let ledger = &mut ctx.accounts.ledger_acc;
        ledger.bump = ctx.bumps.ledger_acc;
        ledger.authority = ctx.accounts.payer.key();
        ledger.prediction_count = 0;

        msg!("Prediction ledger initialized");
        Ok(())
    }

    // ================================================================
    // Prediction Lifecycle
    // ================================================================

    /// Create a prediction with 2 to 4 options at the next sequential id.
    /// Queues an MPC computation to initialize its encrypted tallies.
    ///
    /// Returns the new id; `PredictionCreatedEvent` carries it too.
    pub fn create_prediction(
        ctx: Context<CreatePrediction>,
        computation_offset: u64,
        title: String,
        options: Vec<String>,
        nonce: u128,
    ) -> Result<u32> {
        PredictionAccount::validate_new(&title, &options)?;

        let clock = Clock::get()?;
        let creator = ctx.accounts.payer.key();
        let id = ctx.accounts.ledger_acc.allocate_id()?;

        let prediction = &mut ctx.accounts.prediction_acc;
        prediction.open(
            id,
            creator,
            title,
            options,
            nonce,
            clock.unix_timestamp,
            ctx.bumps.prediction_acc,
        );

        msg!("Creating prediction {} ({} options)", id, prediction.num_options());
        emit!(PredictionCreatedEvent {
            prediction_id: id,
            creator,
            num_options: prediction.num_options(),
            created_at: clock.unix_timestamp,
        });

        let args = ArgBuilder::new().plaintext_u128(nonce).build();

        ctx.accounts.sign_pda_account.bump = ctx.bumps.sign_pda_account;

        queue_computation(
            ctx.accounts,
            computation_offset,
            args,
            vec![InitTalliesCallback::callback_ix(
                computation_offset,
                &ctx.accounts.mxe_account,
                &[CallbackAccount {
                    pubkey: ctx.accounts.prediction_acc.key(),
                    is_writable: true,
                }],
            )?],
            1,
            0,
        )?;

        Ok(id)
    }

    #[arcium_callback(encrypted_ix = "init_tallies")]
    pub fn init_tallies_callback(
        ctx: Context<InitTalliesCallback>,
        output: SignedComputationOutputs<InitTalliesOutput>,
    ) -> Result<()> {
        let prediction = &mut ctx.accounts.prediction_acc;

        match output.verify_output(
            &ctx.accounts.cluster_account,
            &ctx.accounts.computation_account,
        ) {
            Ok(InitTalliesOutput { field_0 }) => {
                prediction.store_tallies(field_0.ciphertexts, field_0.nonce);
            }
            Err(_) => {
                // Stays unusable until `retry_init_tallies` succeeds.
                msg!("Tally initialization aborted for prediction {}", prediction.id);
                prediction.release_computation();
                emit!(ComputationAbortedEvent {
                    prediction_id: prediction.id,
                    computation: "init_tallies".to_string(),
                    timestamp: Clock::get()?.unix_timestamp,
                });
            }
        }

        Ok(())
    }

    /// Queue `init_tallies` again for a prediction whose first
    /// initialization aborted.
    pub fn retry_init_tallies(
        ctx: Context<RetryInitTallies>,
        computation_offset: u64,
        id: u32,
        nonce: u128,
    ) -> Result<()> {
        ctx.accounts.prediction_acc.retry_init(nonce)?;

        msg!("Re-queueing tally initialization for prediction {}", id);
        emit!(ComputationRequeuedEvent {
            prediction_id: id,
            computation: "init_tallies".to_string(),
            requested_by: ctx.accounts.payer.key(),
        });

        let args = ArgBuilder::new().plaintext_u128(nonce).build();

        ctx.accounts.sign_pda_account.bump = ctx.bumps.sign_pda_account;

        queue_computation(
            ctx.accounts,
            computation_offset,
            args,
            vec![InitTalliesCallback::callback_ix(
                computation_offset,
                &ctx.accounts.mxe_account,
                &[CallbackAccount {
                    pubkey: ctx.accounts.prediction_acc.key(),
                    is_writable: true,
                }],
            )?],
            1,
            0,
        )?;

        Ok(())
    }

    /// Cast an encrypted vote.
    ///
    /// The voter encrypts their option index under a secret shared with the
    /// MXE; `vote_encryption_pubkey` and `vote_nonce` bind the ciphertext to
    /// that exchange. The circuit adds one to the matching counter without
    /// decrypting the choice. The voter record prevents double voting.
    pub fn submit_vote(
        ctx: Context<SubmitVote>,
        computation_offset: u64,
        id: u32,
        choice: [u8; 32],
        vote_encryption_pubkey: [u8; 32],
        vote_nonce: u128,
    ) -> Result<()> {
        let voter = ctx.accounts.payer.key();
        let already_voted = ctx.accounts.voter_record.has_voted;
        ctx.accounts.prediction_acc.accept_vote(already_voted)?;
        ctx.accounts
            .voter_record
            .mark(id, voter, ctx.bumps.voter_record);

        // ArgBuilder order must match circuit params:
        // submit_vote(choice_ctxt: Enc<Shared, UserChoice>, num_options: u8, tallies_ctxt: Enc<Mxe, VoteTallies>)
        let args = ArgBuilder::new()
            .x25519_pubkey(vote_encryption_pubkey)
            .plaintext_u128(vote_nonce)
            .encrypted_u8(choice)
            .plaintext_u8(ctx.accounts.prediction_acc.num_options())
            .plaintext_u128(ctx.accounts.prediction_acc.nonce)
            .account(
                ctx.accounts.prediction_acc.key(),
                VOTE_STATE_OFFSET,
                VOTE_STATE_LEN,
            )
            .build();

        ctx.accounts.sign_pda_account.bump = ctx.bumps.sign_pda_account;

        queue_computation(
            ctx.accounts,
            computation_offset,
            args,
            vec![SubmitVoteCallback::callback_ix(
                computation_offset,
                &ctx.accounts.mxe_account,
                &[CallbackAccount {
                    pubkey: ctx.accounts.prediction_acc.key(),
                    is_writable: true,
                }],
            )?],
            1,
            0,
        )?;

        Ok(())
    }

    #[arcium_callback(encrypted_ix = "submit_vote")]
    pub fn submit_vote_callback(
        ctx: Context<SubmitVoteCallback>,
        output: SignedComputationOutputs<SubmitVoteOutput>,
    ) -> Result<()> {
        let clock = Clock::get()?;
        let prediction = &mut ctx.accounts.prediction_acc;

        match output.verify_output(
            &ctx.accounts.cluster_account,
            &ctx.accounts.computation_account,
        ) {
            Ok(SubmitVoteOutput { field_0 }) => {
                prediction.store_tallies(field_0.ciphertexts, field_0.nonce);
                emit!(VoteCastEvent {
                    prediction_id: prediction.id,
                    voter_count: prediction.voter_count,
                    timestamp: clock.unix_timestamp,
                });
            }
            Err(_) => {
                // Keep the previous ciphertexts but don't leave the prediction locked.
                msg!("Vote computation aborted for prediction {}", prediction.id);
                prediction.release_computation();
                emit!(ComputationAbortedEvent {
                    prediction_id: prediction.id,
                    computation: "submit_vote".to_string(),
                    timestamp: clock.unix_timestamp,
                });
            }
        }

        Ok(())
    }

    /// Close a prediction and request public decryption of its tallies.
    ///
    /// Any signer may close an active prediction.
    pub fn close_prediction(
        ctx: Context<ClosePrediction>,
        computation_offset: u64,
        id: u32,
    ) -> Result<()> {
        let clock = Clock::get()?;
        PredictionAccount::close(&mut ctx.accounts.prediction_acc, clock.unix_timestamp)?;

        msg!(
            "Closing prediction {} (id={})",
            ctx.accounts.prediction_acc.title,
            id
        );
        emit!(PredictionClosedEvent {
            prediction_id: id,
            closed_by: ctx.accounts.payer.key(),
            closed_at: clock.unix_timestamp,
            voter_count: ctx.accounts.prediction_acc.voter_count,
        });

        let args = ArgBuilder::new()
            .plaintext_u128(ctx.accounts.prediction_acc.nonce)
            .account(
                ctx.accounts.prediction_acc.key(),
                VOTE_STATE_OFFSET,
                VOTE_STATE_LEN,
            )
            .build();

        ctx.accounts.sign_pda_account.bump = ctx.bumps.sign_pda_account;

        queue_computation(
            ctx.accounts,
            computation_offset,
            args,
            vec![RevealTalliesCallback::callback_ix(
                computation_offset,
                &ctx.accounts.mxe_account,
                &[CallbackAccount {
                    pubkey: ctx.accounts.prediction_acc.key(),
                    is_writable: true,
                }],
            )?],
            1,
            0,
        )?;

        Ok(())
    }

    #[arcium_callback(encrypted_ix = "reveal_tallies")]
    pub fn reveal_tallies_callback(
        ctx: Context<RevealTalliesCallback>,
        output: SignedComputationOutputs<RevealTalliesOutput>,
    ) -> Result<()> {
        let counts = match output.verify_output(
            &ctx.accounts.cluster_account,
            &ctx.accounts.computation_account,
        ) {
            Ok(RevealTalliesOutput {
                field_0:
                    RevealTalliesOutputStruct0 {
                        field_0,
                        field_1,
                        field_2,
                        field_3,
                    },
            }) => [field_0, field_1, field_2, field_3],
            Err(_) => {
                let prediction = &mut ctx.accounts.prediction_acc;
                msg!("Reveal aborted for prediction {}", prediction.id);
                prediction.release_computation();
                emit!(ComputationAbortedEvent {
                    prediction_id: prediction.id,
                    computation: "reveal_tallies".to_string(),
                    timestamp: Clock::get()?.unix_timestamp,
                });
                return Ok(());
            }
        };

        let prediction = &mut ctx.accounts.prediction_acc;
        prediction.publish_results(counts)?;

        emit!(ResultsRevealedEvent {
            prediction_id: prediction.id,
            counts: counts[..prediction.options.len()].to_vec(),
        });

        Ok(())
    }

    /// Queue `reveal_tallies` again for a closed prediction whose reveal
    /// aborted. Any signer may ask.
    pub fn retry_reveal(ctx: Context<RetryReveal>, computation_offset: u64, id: u32) -> Result<()> {
        ctx.accounts.prediction_acc.retry_reveal()?;

        msg!("Re-queueing reveal for prediction {}", id);
        emit!(ComputationRequeuedEvent {
            prediction_id: id,
            computation: "reveal_tallies".to_string(),
            requested_by: ctx.accounts.payer.key(),
        });

        let args = ArgBuilder::new()
            .plaintext_u128(ctx.accounts.prediction_acc.nonce)
            .account(
                ctx.accounts.prediction_acc.key(),
                VOTE_STATE_OFFSET,
                VOTE_STATE_LEN,
            )
            .build();

        ctx.accounts.sign_pda_account.bump = ctx.bumps.sign_pda_account;

        queue_computation(
            ctx.accounts,
            computation_offset,
            args,
            vec![RevealTalliesCallback::callback_ix(
                computation_offset,
                &ctx.accounts.mxe_account,
                &[CallbackAccount {
                    pubkey: ctx.accounts.prediction_acc.key(),
                    is_writable: true,
                }],
            )?],
            1,
            0,
        )?;

        Ok(())
    }

    // ================================================================
    // Reads
    // ================================================================

    pub fn get_prediction_count(ctx: Context<ReadLedger>) -> Result<u32> {
        Ok(ctx.accounts.ledger_acc.prediction_count)
    }

    pub fn get_prediction(ctx: Context<ReadPrediction>, _id: u32) -> Result<PredictionView> {
        Ok(PredictionView::from(&*ctx.accounts.prediction_acc))
    }

    /// False for predictions that don't exist, same as for non-voters.
    pub fn has_user_voted(ctx: Context<HasUserVoted>, _id: u32, _voter: Pubkey) -> Result<bool> {
        let record = &ctx.accounts.voter_record;
        Ok(record.owner == &ID && !record.data_is_empty())
    }
}

// ============================================================
// Account Structs: Computation Definition Initializers
// ============================================================

#[init_computation_definition_accounts("init_tallies", payer)]
#[derive(Accounts)]
pub struct InitTalliesCompDef<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(mut, address = derive_mxe_pda!())]
    pub mxe_account: Box<Account<'info, MXEAccount>>,
    #[account(mut)]
    /// CHECK: comp_def_account, checked by arcium program.
    pub comp_def_account: UncheckedAccount<'info>,
    #[account(mut, address = derive_mxe_lut_pda!(mxe_account.lut_offset_slot))]
    /// CHECK: address_lookup_table, checked by arcium program.
    pub address_lookup_table: UncheckedAccount<'info>,
    #[account(address = LUT_PROGRAM_ID)]
    /// CHECK: lut_program is the Address Lookup Table program.
    pub lut_program: UncheckedAccount<'info>,
    pub arcium_program: Program<'info, Arcium>,
    pub system_program: Program<'info, System>,
}

#[init_computation_definition_accounts("submit_vote", payer)]
#[derive(Accounts)]
pub struct InitVoteCompDef<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(mut, address = derive_mxe_pda!())]
    pub mxe_account: Box<Account<'info, MXEAccount>>,
    #[account(mut)]
    /// CHECK: comp_def_account, checked by arcium program.
    pub comp_def_account: UncheckedAccount<'info>,
    #[account(mut, address = derive_mxe_lut_pda!(mxe_account.lut_offset_slot))]
    /// CHECK: address_lookup_table, checked by arcium program.
    pub address_lookup_table: UncheckedAccount<'info>,
    #[account(address = LUT_PROGRAM_ID)]
    /// CHECK: lut_program is the Address Lookup Table program.
    pub lut_program: UncheckedAccount<'info>,
    pub arcium_program: Program<'info, Arcium>,
    pub system_program: Program<'info, System>,
}

#[init_computation_definition_accounts("reveal_tallies", payer)]
#[derive(Accounts)]
pub struct InitRevealCompDef<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(mut, address = derive_mxe_pda!())]
    pub mxe_account: Box<Account<'info, MXEAccount>>,
    #[account(mut)]
    /// CHECK: comp_def_account, checked by arcium program.
    pub comp_def_account: UncheckedAccount<'info>,
    #[account(mut, address = derive_mxe_lut_pda!(mxe_account.lut_offset_slot))]
    /// CHECK: address_lookup_table, checked by arcium program.
    pub address_lookup_table: UncheckedAccount<'info>,
    #[account(address = LUT_PROGRAM_ID)]
    /// CHECK: lut_program is the Address Lookup Table program.
    pub lut_program: UncheckedAccount<'info>,
    pub arcium_program: Program<'info, Arcium>,
    pub system_program: Program<'info, System>,
}

// ============================================================
// Account Structs: Ledger
// ============================================================

#[derive(Accounts)]
pub struct InitializeLedger<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(
        init, payer = payer,
        space = 8 + LedgerAccount::INIT_SPACE,
        seeds = [LEDGER_SEED],
        bump,
    )]
    pub ledger_acc: Account<'info, LedgerAccount>,
    pub system_program: Program<'info, System>,
}

// ============================================================
// Account Structs: Create
// ============================================================

#[queue_computation_accounts("init_tallies", payer)]
#[derive(Accounts)]
#[instruction(computation_offset: u64)]
pub struct CreatePrediction<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(
        init_if_needed, space = 9, payer = payer,
        seeds = [&SIGN_PDA_SEED], bump,
        address = derive_sign_pda!(),
    )]
    pub sign_pda_account: Account<'info, ArciumSignerAccount>,
    #[account(address = derive_mxe_pda!())]
    pub mxe_account: Account<'info, MXEAccount>,
    #[account(mut, address = derive_mempool_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: mempool_account
    pub mempool_account: UncheckedAccount<'info>,
    #[account(mut, address = derive_execpool_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: executing_pool
    pub executing_pool: UncheckedAccount<'info>,
    #[account(mut, address = derive_comp_pda!(computation_offset, mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: computation_account
    pub computation_account: UncheckedAccount<'info>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_INIT_TALLIES))]
    pub comp_def_account: Account<'info, ComputationDefinitionAccount>,
    #[account(mut, address = derive_cluster_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    pub cluster_account: Account<'info, Cluster>,
    #[account(mut, address = ARCIUM_FEE_POOL_ACCOUNT_ADDRESS)]
    pub pool_account: Account<'info, FeePool>,
    #[account(mut, address = ARCIUM_CLOCK_ACCOUNT_ADDRESS)]
    pub clock_account: Account<'info, ClockAccount>,
    pub system_program: Program<'info, System>,
    pub arcium_program: Program<'info, Arcium>,
    #[account(mut, seeds = [LEDGER_SEED], bump = ledger_acc.bump)]
    pub ledger_acc: Account<'info, LedgerAccount>,
    #[account(
        init, payer = payer,
        space = 8 + PredictionAccount::INIT_SPACE,
        seeds = [PREDICTION_SEED, ledger_acc.prediction_count.to_le_bytes().as_ref()],
        bump,
    )]
    pub prediction_acc: Box<Account<'info, PredictionAccount>>,
}

#[callback_accounts("init_tallies")]
#[derive(Accounts)]
pub struct InitTalliesCallback<'info> {
    pub arcium_program: Program<'info, Arcium>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_INIT_TALLIES))]
    pub comp_def_account: Account<'info, ComputationDefinitionAccount>,
    #[account(address = derive_mxe_pda!())]
    pub mxe_account: Account<'info, MXEAccount>,
    /// CHECK: computation_account
    pub computation_account: UncheckedAccount<'info>,
    #[account(address = derive_cluster_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    pub cluster_account: Account<'info, Cluster>,
    #[account(address = ::anchor_lang::solana_program::sysvar::instructions::ID)]
    /// CHECK: instructions_sysvar
    pub instructions_sysvar: AccountInfo<'info>,
    #[account(mut)]
    pub prediction_acc: Box<Account<'info, PredictionAccount>>,
}

#[queue_computation_accounts("init_tallies", payer)]
#[derive(Accounts)]
#[instruction(computation_offset: u64, id: u32)]
pub struct RetryInitTallies<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(
        init_if_needed, space = 9, payer = payer,
        seeds = [&SIGN_PDA_SEED], bump,
        address = derive_sign_pda!(),
    )]
    pub sign_pda_account: Account<'info, ArciumSignerAccount>,
    #[account(address = derive_mxe_pda!())]
    pub mxe_account: Account<'info, MXEAccount>,
    #[account(mut, address = derive_mempool_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: mempool_account
    pub mempool_account: UncheckedAccount<'info>,
    #[account(mut, address = derive_execpool_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: executing_pool
    pub executing_pool: UncheckedAccount<'info>,
    #[account(mut, address = derive_comp_pda!(computation_offset, mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: computation_account
    pub computation_account: UncheckedAccount<'info>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_INIT_TALLIES))]
    pub comp_def_account: Account<'info, ComputationDefinitionAccount>,
    #[account(mut, address = derive_cluster_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    pub cluster_account: Account<'info, Cluster>,
    #[account(mut, address = ARCIUM_FEE_POOL_ACCOUNT_ADDRESS)]
    pub pool_account: Account<'info, FeePool>,
    #[account(mut, address = ARCIUM_CLOCK_ACCOUNT_ADDRESS)]
    pub clock_account: Account<'info, ClockAccount>,
    pub system_program: Program<'info, System>,
    pub arcium_program: Program<'info, Arcium>,
    #[account(
        mut,
        seeds = [PREDICTION_SEED, id.to_le_bytes().as_ref()],
        bump = prediction_acc.bump,
    )]
    pub prediction_acc: Box<Account<'info, PredictionAccount>>,
}

// ============================================================
// Account Structs: Voting
// ============================================================

#[queue_computation_accounts("submit_vote", payer)]
#[derive(Accounts)]
#[instruction(computation_offset: u64, id: u32)]
pub struct SubmitVote<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(
        init_if_needed, space = 9, payer = payer,
        seeds = [&SIGN_PDA_SEED], bump,
        address = derive_sign_pda!(),
    )]
    pub sign_pda_account: Account<'info, ArciumSignerAccount>,
    #[account(address = derive_mxe_pda!())]
    pub mxe_account: Account<'info, MXEAccount>,
    #[account(mut, address = derive_mempool_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: mempool_account
    pub mempool_account: UncheckedAccount<'info>,
    #[account(mut, address = derive_execpool_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: executing_pool
    pub executing_pool: UncheckedAccount<'info>,
    #[account(mut, address = derive_comp_pda!(computation_offset, mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: computation_account
    pub computation_account: UncheckedAccount<'info>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_SUBMIT_VOTE))]
    pub comp_def_account: Account<'info, ComputationDefinitionAccount>,
    #[account(mut, address = derive_cluster_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    pub cluster_account: Account<'info, Cluster>,
    #[account(mut, address = ARCIUM_FEE_POOL_ACCOUNT_ADDRESS)]
    pub pool_account: Account<'info, FeePool>,
    #[account(mut, address = ARCIUM_CLOCK_ACCOUNT_ADDRESS)]
    pub clock_account: Account<'info, ClockAccount>,
    pub system_program: Program<'info, System>,
    pub arcium_program: Program<'info, Arcium>,
    #[account(
        mut,
        seeds = [PREDICTION_SEED, id.to_le_bytes().as_ref()],
        bump = prediction_acc.bump,
    )]
    pub prediction_acc: Box<Account<'info, PredictionAccount>>,
    // init_if_needed so a repeat vote reaches the handler and fails with AlreadyVoted
    #[account(
        init_if_needed, payer = payer,
        space = 8 + VoterRecord::INIT_SPACE,
        seeds = [VOTER_SEED, id.to_le_bytes().as_ref(), payer.key().as_ref()],
        bump,
    )]
    pub voter_record: Account<'info, VoterRecord>,
}

#[callback_accounts("submit_vote")]
#[derive(Accounts)]
pub struct SubmitVoteCallback<'info> {
    pub arcium_program: Program<'info, Arcium>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_SUBMIT_VOTE))]
    pub comp_def_account: Account<'info, ComputationDefinitionAccount>,
    #[account(address = derive_mxe_pda!())]
    pub mxe_account: Account<'info, MXEAccount>,
    /// CHECK: computation_account
    pub computation_account: UncheckedAccount<'info>,
    #[account(address = derive_cluster_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    pub cluster_account: Account<'info, Cluster>,
    #[account(address = ::anchor_lang::solana_program::sysvar::instructions::ID)]
    /// CHECK: instructions_sysvar
    pub instructions_sysvar: AccountInfo<'info>,
    #[account(mut)]
    pub prediction_acc: Box<Account<'info, PredictionAccount>>,
}

// ============================================================
// Account Structs: Close
// ============================================================

#[queue_computation_accounts("reveal_tallies", payer)]
#[derive(Accounts)]
#[instruction(computation_offset: u64, id: u32)]
pub struct ClosePrediction<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(
        init_if_needed, space = 9, payer = payer,
        seeds = [&SIGN_PDA_SEED], bump,
        address = derive_sign_pda!(),
    )]
    pub sign_pda_account: Account<'info, ArciumSignerAccount>,
    #[account(address = derive_mxe_pda!())]
    pub mxe_account: Account<'info, MXEAccount>,
    #[account(mut, address = derive_mempool_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: mempool_account
    pub mempool_account: UncheckedAccount<'info>,
    #[account(mut, address = derive_execpool_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: executing_pool
    pub executing_pool: UncheckedAccount<'info>,
    #[account(mut, address = derive_comp_pda!(computation_offset, mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: computation_account
    pub computation_account: UncheckedAccount<'info>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_REVEAL_TALLIES))]
    pub comp_def_account: Account<'info, ComputationDefinitionAccount>,
    #[account(mut, address = derive_cluster_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    pub cluster_account: Account<'info, Cluster>,
    #[account(mut, address = ARCIUM_FEE_POOL_ACCOUNT_ADDRESS)]
    pub pool_account: Account<'info, FeePool>,
    #[account(mut, address = ARCIUM_CLOCK_ACCOUNT_ADDRESS)]
    pub clock_account: Account<'info, ClockAccount>,
    pub system_program: Program<'info, System>,
    pub arcium_program: Program<'info, Arcium>,
    #[account(
        mut,
        seeds = [PREDICTION_SEED, id.to_le_bytes().as_ref()],
        bump = prediction_acc.bump,
    )]
    pub prediction_acc: Box<Account<'info, PredictionAccount>>,
}

#[callback_accounts("reveal_tallies")]
#[derive(Accounts)]
pub struct RevealTalliesCallback<'info> {
    pub arcium_program: Program<'info, Arcium>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_REVEAL_TALLIES))]
    pub comp_def_account: Account<'info, ComputationDefinitionAccount>,
    #[account(address = derive_mxe_pda!())]
    pub mxe_account: Account<'info, MXEAccount>,
    /// CHECK: computation_account
    pub computation_account: UncheckedAccount<'info>,
    #[account(address = derive_cluster_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    pub cluster_account: Account<'info, Cluster>,
    #[account(address = ::anchor_lang::solana_program::sysvar::instructions::ID)]
    /// CHECK: instructions_sysvar
    pub instructions_sysvar: AccountInfo<'info>,
    #[account(mut)]
    pub prediction_acc: Box<Account<'info, PredictionAccount>>,
}

#[queue_computation_accounts("reveal_tallies", payer)]
#[derive(Accounts)]
#[instruction(computation_offset: u64, id: u32)]
pub struct RetryReveal<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(
        init_if_needed, space = 9, payer = payer,
        seeds = [&SIGN_PDA_SEED], bump,
        address = derive_sign_pda!(),
    )]
    pub sign_pda_account: Account<'info, ArciumSignerAccount>,
    #[account(address = derive_mxe_pda!())]
    pub mxe_account: Account<'info, MXEAccount>,
    #[account(mut, address = derive_mempool_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: mempool_account
    pub mempool_account: UncheckedAccount<'info>,
    #[account(mut, address = derive_execpool_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: executing_pool
    pub executing_pool: UncheckedAccount<'info>,
    #[account(mut, address = derive_comp_pda!(computation_offset, mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: computation_account
    pub computation_account: UncheckedAccount<'info>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_REVEAL_TALLIES))]
    pub comp_def_account: Account<'info, ComputationDefinitionAccount>,
    #[account(mut, address = derive_cluster_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    pub cluster_account: Account<'info, Cluster>,
    #[account(mut, address = ARCIUM_FEE_POOL_ACCOUNT_ADDRESS)]
    pub pool_account: Account<'info, FeePool>,
    #[account(mut, address = ARCIUM_CLOCK_ACCOUNT_ADDRESS)]
    pub clock_account: Account<'info, ClockAccount>,
    pub system_program: Program<'info, System>,
    pub arcium_program: Program<'info, Arcium>,
    #[account(
        mut,
        seeds = [PREDICTION_SEED, id.to_le_bytes().as_ref()],
        bump = prediction_acc.bump,
    )]
    pub prediction_acc: Box<Account<'info, PredictionAccount>>,
}

// ============================================================
// Account Structs: Reads
// ============================================================

#[derive(Accounts)]
pub struct ReadLedger<'info> {
    #[account(seeds = [LEDGER_SEED], bump = ledger_acc.bump)]
    pub ledger_acc: Account<'info, LedgerAccount>,
}

#[derive(Accounts)]
#[instruction(id: u32)]
pub struct ReadPrediction<'info> {
    #[account(
        seeds = [PREDICTION_SEED, id.to_le_bytes().as_ref()],
        bump = prediction_acc.bump,
    )]
    pub prediction_acc: Account<'info, PredictionAccount>,
}

#[derive(Accounts)]
#[instruction(id: u32, voter: Pubkey)]
pub struct HasUserVoted<'info> {
    #[account(
        seeds = [VOTER_SEED, id.to_le_bytes().as_ref(), voter.as_ref()],
        bump,
    )]
    /// CHECK: may be uninitialized; its existence is the answer
    pub voter_record: UncheckedAccount<'info>,
}
