/*!

# How an elimination vote runs

A session is configured once with an ordered list of voters and an ordered
list of candidates. It then walks through a fixed sequence of stages:

```text
Setup -> Voting -> Announce -> Eliminated -> Voting -> ... -> Winner
```

**Voting** Each voter, in universe order, submits one full ranking of the
candidates that are still in the race. A ranking that is incomplete,
contains a duplicate or a blank, or names an unknown candidate is rejected
with a descriptive error and the same voter is asked again; nothing else in
the session changes. Once the last voter's ballot is in, the session moves
to `Announce` on its own.

**Reveal** Revealing the result scores the round. Every ballot gives 1
point to its first choice, 2 points to its second, and so on, so a low
total is a good total. The candidate with the highest total is eliminated.
If several candidates share the highest total, one of them is drawn
uniformly at random; the randomness is an injectable capability so that a
replayed election (or a test) can use a seeded source and get the same
outcome every time.

**Elimination and victory** While more than two candidates are active, the
eliminated candidate leaves the race and the next round starts with fresh
ballots. When exactly two candidates are left, the reveal instead declares
the survivor the winner; the eliminated runner-up is still appended to the
history, so the number of recorded rounds for `N` candidates is always
`N - 1`.

**Reset** A reset is accepted at any point and returns the session to
`Setup` with the full candidate slate, as if it had just been built.

The per-round score maps and the eliminated candidates are kept in two
parallel histories, which is all a report needs:

```text
round 1: {Taghazout: 7, Malta: 12, Albanie: 11} eliminated: Malta
round 2: {Taghazout: 7, Albanie: 8}             eliminated: Albanie
winner: Taghazout
```

*/
